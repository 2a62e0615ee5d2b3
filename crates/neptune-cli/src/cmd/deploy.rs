use super::Ctx;
use crate::output::{print_json, Reported, Ui};
use neptune_core::deploy::{DeployEvent, DeployObserver, DeployOptions, DeployOutcome, Deployer};
use neptune_core::docker::SystemDocker;
use neptune_core::dockerfile::DockerfileGuidance;
use neptune_core::lint::LintAssessment;
use neptune_core::models::{AiLintReport, ProjectSpec};
use neptune_core::NeptuneError;

/// Renders orchestrator progress and asks for confirmation.
struct Terminal {
    ui: Ui,
    yes: bool,
}

impl DeployObserver for Terminal {
    fn event(&mut self, event: DeployEvent) {
        match event {
            DeployEvent::Stage(stage) => self.ui.header(&stage.to_string()),
            DeployEvent::Status(line) => self.ui.step("", &line),
            DeployEvent::Completed(line) => self.ui.success(&line),
            DeployEvent::Warning(line) => self.ui.warn(&line),
        }
    }

    fn lint_report(&mut self, report: &AiLintReport, assessment: &LintAssessment) {
        self.ui.lint_report(report, Some(assessment));
    }

    fn confirm_proceed(&mut self, spec: &ProjectSpec) -> bool {
        if self.yes || self.ui.is_json() {
            return true;
        }
        self.ui.step("📦", &format!("Project: {}", spec.name));
        for r in &spec.resources {
            self.ui.step("", &format!("• {} {}", r.kind, r.name));
        }
        match self.ui.confirm("Proceed with build and deployment?", false) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::debug!(error = %e, "confirmation prompt failed");
                false
            }
        }
    }
}

pub fn run(ctx: &Ctx, opts: DeployOptions, yes: bool) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let docker = SystemDocker::new();
    let mut observer = Terminal { ui: ctx.ui, yes };

    let outcome = Deployer::new(&client, &docker).run(&ctx.dir, &opts, &mut observer);

    if ctx.ui.is_json() {
        print_json(&outcome)?;
    } else {
        render(&ctx.ui, &outcome);
    }

    if outcome.ok || outcome.aborted_by_user {
        Ok(())
    } else {
        Err(Reported.into())
    }
}

fn render(ui: &Ui, outcome: &DeployOutcome) {
    if outcome.aborted_by_user {
        ui.step("", "Aborted by user.");
        return;
    }

    if !outcome.ok {
        match (&outcome.error, &outcome.dockerfile_guidance) {
            (Some(NeptuneError::DockerfileNotFound), Some(g)) => render_dockerfile_help(ui, g),
            (None, _) if outcome.lint.as_ref().is_some_and(|a| a.blocking) => {
                ui.info("Use --allow-ai-errors / --allow-ai-warnings to override.");
                ui.info("Deployment aborted; resolve findings or override to continue.");
            }
            _ => {
                let mut messages = outcome.messages.iter();
                if let Some(first) = messages.next() {
                    ui.error(first);
                }
                for m in messages {
                    ui.info(m);
                }
            }
        }
        ui.step("👉", &format!("Next: {}", outcome.next_action_command));
        return;
    }

    ui.header("Status");
    if let Some(cond) = &outcome.final_condition {
        let healthy = super::project::render_condition(
            ui,
            &cond.provisioning_state,
            &cond.running_status.current,
            "",
        );
        if let Some(url) = &outcome.final_url {
            ui.step("", &format!("URL: {url}"));
        }
        if healthy {
            ui.success("Deployment complete!");
        }
    }
    if !outcome.deployment_confirmed {
        ui.info("Run `neptune status` to follow the rollout.");
    }
}

fn render_dockerfile_help(ui: &Ui, g: &DockerfileGuidance) {
    ui.warn("Dockerfile not found in project directory");
    ui.step("", &format!("Detected project type: {}", g.project_type));
    if let Some(cmd) = &g.start_command {
        ui.step("", &format!("Detected start command: {cmd}"));
    }
    ui.info("A Dockerfile is required to deploy to Neptune.");
    ui.step("📝", "Example Dockerfile:");
    ui.plain("");
    ui.plain(&g.dockerfile_example);
    ui.plain("");
    ui.info("Requirements:");
    for req in &g.requirements {
        ui.step("  •", req);
    }
    ui.info("After creating the Dockerfile, run 'neptune deploy' again.");
}

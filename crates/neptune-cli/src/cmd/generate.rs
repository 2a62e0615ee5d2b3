use super::Ctx;
use crate::output::CommandResult;
use clap::Subcommand;
use clap_complete::Shell;
use neptune_core::agents::{self, AgentsMdChange};
use neptune_core::{lint, spec};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum GenerateSubcommand {
    /// Generate neptune.json from the project sources
    Spec,
    /// Create or update AGENTS.md with Neptune instructions for coding agents
    Agents,
    /// Generate shell completions
    Shell {
        shell: Shell,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output_file: Option<PathBuf>,
    },
}

pub fn spec(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("neptune.json");

    let project = spec::resolve_project_name(&ctx.dir);
    ui.step("", "Analyzing project and generating configuration...");

    let client = ctx.client()?;
    let resolution = match spec::resolve_spec(&client, &ctx.dir, &project, false, true) {
        Ok(r) => r,
        Err(e) => {
            let result = CommandResult::failure(vec![e.to_string()], "neptune generate spec")
                .with("spec_path", "");
            return ui.finish(&result);
        }
    };

    for w in &resolution.warnings {
        ui.warn(w);
    }
    if resolution.changed {
        ui.step("", &format!("Wrote {}", resolution.spec_path.display()));
        ui.success("Generated neptune.json");
    } else {
        ui.success("neptune.json up to date");
    }
    if let Some(cmd) = &resolution.start_command {
        ui.detail(&format!("Start command: {cmd}"));
    }

    // Findings are informational here; the deploy gate enforces them.
    if let Some(report) = &resolution.lint_report {
        let assessment = lint::assess(report, false, false);
        ui.lint_report(report, Some(&assessment));
        if assessment.blocking {
            ui.info("Use --allow-ai-errors / --allow-ai-warnings to override during deploy.");
        }
    }

    let mut result = CommandResult::success("neptune deploy")
        .with("spec_path", resolution.spec_path.display().to_string());
    if resolution.changed {
        result = result
            .message(format!(
                "Created or updated neptune.json at {}",
                resolution.spec_path.display()
            ))
            .message("Review the generated configuration to ensure it matches your project.");
    }
    if let Some(report) = &resolution.lint_report {
        result = result.with("ai_lint_report", report);
    }
    ui.finish(&result)
}

pub fn agents(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("AGENTS.md");
    ui.step("", "Fetching latest Neptune agent instructions...");

    let client = ctx.client()?;
    let res = match agents::update_agents_md(&client, &ctx.dir) {
        Ok(r) => r,
        Err(e) => {
            let result = CommandResult::failure(
                vec![format!("Failed to update AGENTS.md: {e}")],
                "neptune generate agents",
            );
            return ui.finish(&result);
        }
    };

    let path = res.path.display();
    match &res.change {
        AgentsMdChange::Created => ui.step("", &format!("Created {path}")),
        AgentsMdChange::Appended => ui.step("", "Appending Neptune instructions to AGENTS.md"),
        AgentsMdChange::Updated { from, to } => {
            ui.step("", &format!("Updating Neptune instructions (v{from} → v{to})"))
        }
        AgentsMdChange::UpToDate { .. } => {}
    }
    if res.changed() {
        ui.success("AGENTS.md updated");
    } else {
        ui.success("AGENTS.md up to date");
    }

    ui.finish(&CommandResult::success("neptune deploy").with("agents_md", &res))
}

/// Write completions for `cmd`, the fully built CLI definition.
pub fn shell(
    cmd: &mut clap::Command,
    shell: Shell,
    output_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    match output_file {
        Some(path) => {
            let mut file = std::fs::File::create(&path)?;
            clap_complete::generate(shell, cmd, "neptune", &mut file);
            eprintln!("Completions written to {}", path.display());
        }
        None => clap_complete::generate(shell, cmd, "neptune", &mut std::io::stdout()),
    }
    Ok(())
}

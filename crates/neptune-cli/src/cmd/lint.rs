use super::Ctx;
use crate::output::CommandResult;
use neptune_core::{lint, paths, spec};

pub fn run(ctx: &Ctx, allow_ai_errors: bool, allow_ai_warnings: bool) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("AI Lint");

    let project = spec::resolve_project_name(&ctx.dir);
    let spec_path = paths::spec_path(&ctx.dir);
    if !spec_path.is_file() {
        ui.warn("neptune.json not found in the current workspace");
        ui.info(&format!("Expected to find {}", spec_path.display()));
        let result = CommandResult::failure(
            vec![format!(
                "Missing {}. Run `neptune generate spec` before linting.",
                spec_path.display()
            )],
            "neptune generate spec",
        )
        .with("project", &project);
        return ui.finish(&result);
    }

    ui.step("", "Analyzing project with AI lint...");
    let client = ctx.client()?;
    let report = match lint::run_ai_lint(&client, &ctx.dir) {
        Ok(r) => r,
        Err(e) => {
            let result = CommandResult::failure(
                vec![format!("Failed to run AI lint: {e}")],
                "neptune lint",
            )
            .with("project", &project);
            return ui.finish(&result);
        }
    };

    let assessment = lint::assess(&report, allow_ai_errors, allow_ai_warnings);
    ui.lint_report(&report, Some(&assessment));

    let result = if assessment.blocking {
        ui.info("Use --allow-ai-errors / --allow-ai-warnings to override.");
        CommandResult::failure(assessment.reasons.clone(), "neptune lint")
    } else {
        ui.success("No blocking AI lint findings");
        CommandResult::success("neptune deploy")
    };
    let result = result.with("project", &project).with("ai_lint_report", &report);

    // Blocking reasons were already printed as warnings.
    if assessment.blocking && !ui.is_json() {
        return Err(crate::output::Reported.into());
    }
    ui.finish(&result)
}

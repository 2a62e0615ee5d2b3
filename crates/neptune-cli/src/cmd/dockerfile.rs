use super::Ctx;
use crate::output::CommandResult;
use neptune_core::dockerfile;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let g = dockerfile::guidance(&ctx.dir);

    let (status, message, next) = if g.dockerfile_exists {
        (
            "dockerfile_found",
            "A Dockerfile already exists. You can proceed with 'neptune deploy'.",
            "neptune deploy",
        )
    } else {
        (
            "dockerfile_needed",
            "No Dockerfile found. Create one using the example provided.",
            "Create Dockerfile, then: neptune deploy",
        )
    };

    ui.header("Dockerfile");
    if g.dockerfile_exists {
        ui.success("Dockerfile found");
    } else {
        ui.warn("No Dockerfile found");
    }
    ui.step("", &format!("Detected project type: {}", g.project_type));
    if !g.detected_files.is_empty() {
        ui.detail(&format!("Detected files: {}", g.detected_files.join(", ")));
    }
    if let Some(cmd) = &g.start_command {
        ui.step("", &format!("Detected start command: {cmd}"));
    }
    if !g.dockerfile_exists {
        ui.step("📝", "Example Dockerfile:");
        ui.plain("");
        ui.plain(&g.dockerfile_example);
        ui.plain("");
    }
    ui.info("Requirements:");
    for req in &g.requirements {
        ui.step("  •", req);
    }
    ui.info("Best practices:");
    for bp in &g.best_practices {
        ui.step("  •", bp);
    }
    ui.info(message);

    let result = CommandResult::success(next)
        .message(message)
        .with("status", status)
        .with("dockerfile_guidance", &g);
    ui.finish(&result)
}

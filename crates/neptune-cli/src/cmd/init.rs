use super::Ctx;
use crate::output::{CommandResult, Ui};
use neptune_core::client::Client;
use neptune_core::{agents, spec, template};
use std::path::{Path, PathBuf};

pub struct InitArgs {
    pub name: Option<String>,
    pub from: Option<String>,
    pub subfolder: Option<String>,
    pub no_git: bool,
    pub path: PathBuf,
}

pub fn run(ctx: &Ctx, args: InitArgs) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("Init");

    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        ctx.dir.join(&args.path)
    };
    let default_name = dir_name(&target).or_else(|| dir_name(&ctx.dir));
    let name = match args.name {
        Some(n) => n,
        None => ui.input("Project name", default_name.as_deref())?,
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        return ui.finish(&CommandResult::failure(
            vec!["Project name is required".into()],
            "neptune init --name <name>",
        ));
    }

    if let Some(url) = &args.from {
        if template::is_non_empty_dir(&target)
            && !ui.confirm("Target directory is not empty. Are you sure?", false)?
        {
            ui.step("", "Aborted");
            return Ok(());
        }
        ui.step("", &format!("Cloning template into {}", target.display()));
        let subfolder = args.subfolder.as_deref();
        if let Err(e) = template::clone_template(url, &target, subfolder, !args.no_git) {
            return ui.finish(&CommandResult::failure(
                vec![format!("Failed to clone template: {e}")],
                "neptune init",
            ));
        }
    } else {
        std::fs::create_dir_all(&target)?;
        ui.step("", &format!("Initializing in {}", target.display()));
    }

    spec::write_project_metadata(&target, &name)?;
    write_agents_md(ctx, ui, &target);

    ui.success("Project initialized");
    ui.step("", &format!("Path: {}", target.display()));
    if target != ctx.dir {
        ui.plain("You can `cd` to the directory, then:");
    }
    ui.plain("Run `neptune deploy` to deploy it.");

    ui.finish(
        &CommandResult::success("neptune deploy")
            .message("Project initialized")
            .with("project", &name)
            .with("path", target.display().to_string()),
    )
}

/// AGENTS.md is a convenience; failures only warn.
fn write_agents_md(ctx: &Ctx, ui: &Ui, dir: &Path) {
    let result = Client::new(&ctx.config).and_then(|c| agents::update_agents_md(&c, dir));
    match result {
        Ok(res) if res.changed() => ui.success("AGENTS.md updated"),
        Ok(_) => ui.success("AGENTS.md up to date"),
        Err(e) => ui.warn(&format!("Could not fetch AGENTS.md content: {e}")),
    }
}

fn dir_name(p: &Path) -> Option<String> {
    let p = std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    p.file_name().map(|n| n.to_string_lossy().into_owned())
}

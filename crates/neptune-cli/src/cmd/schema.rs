use super::Ctx;
use crate::output::{print_json, CommandResult};
use neptune_core::client::PlatformApi;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let client = ctx.client()?;

    let schema = match client.get_project_schema() {
        Ok(s) => s,
        Err(e) => {
            let result = CommandResult::failure(
                vec![
                    format!("Failed to fetch schema: {e}"),
                    "Make sure you're logged in with 'neptune login'".into(),
                ],
                "neptune login",
            );
            return ui.finish(&result);
        }
    };

    // JSON mode prints the schema itself, unwrapped.
    if !ui.is_json() {
        ui.header("Project Schema");
        ui.step("", "JSON Schema defining valid neptune.json configurations:");
        println!();
    }
    print_json(&schema)
}

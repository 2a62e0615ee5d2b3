use super::Ctx;
use crate::oauth::{CallbackServer, LOGIN_TIMEOUT};
use crate::output::CommandResult;
use neptune_core::client::{Client, PlatformApi};
use neptune_core::config::{self, ConfigOverrides, EffectiveConfig};

pub fn login(ctx: &Ctx, api_key: Option<String>) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("Login");

    let config_path = config::default_config_path()?;

    if let Some(key) = api_key {
        ui.step("", "Validating API key...");
        let cfg = EffectiveConfig::resolve(&ConfigOverrides {
            auth_token: Some(key.clone()),
            ..Default::default()
        });
        let user = match Client::new(&cfg).and_then(|c| c.get_current_user()) {
            Ok(u) => u,
            Err(e) => {
                return ui.finish(&CommandResult::failure(
                    vec![format!("Login failed: {e}")],
                    "neptune login",
                ))
            }
        };
        config::store_api_key(&config_path, &key)?;
        tracing::info!(user = %user.id, "api key stored");
        ui.success(&format!("Logged in as {}", user.id));
        return ui.finish(&CommandResult::success("neptune deploy").with("user_id", &user.id));
    }

    let server = CallbackServer::start(LOGIN_TIMEOUT)?;
    let url = server.login_url(&ctx.config.api_base_url);
    if let Err(e) = open::that(&url) {
        tracing::debug!(error = %e, "could not open browser");
        ui.plain("Please open the following URL in a browser to log in:");
        ui.plain("");
        ui.plain(&format!("    {url}"));
        ui.plain("");
    } else {
        ui.step("", "Waiting for browser login to complete...");
    }

    match server.wait() {
        Some(token) => {
            config::store_access_token(&config_path, &token)?;
            ui.success("Login successful!");
            ui.finish(&CommandResult::success("neptune deploy"))
        }
        None => ui.finish(&CommandResult::failure(
            vec!["Login failed".into()],
            "neptune login",
        )),
    }
}

pub fn logout(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("Logout");
    config::clear_auth(&config::default_config_path()?)?;
    ui.success("Logged out");
    ui.finish(&CommandResult::success("neptune login"))
}

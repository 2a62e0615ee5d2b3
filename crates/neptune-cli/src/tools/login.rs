use super::{NeptuneTool, ToolCtx};
use crate::oauth::{CallbackServer, LOGIN_TIMEOUT};
use neptune_core::config;

pub struct LoginTool;

impl NeptuneTool for LoginTool {
    fn name(&self) -> &str {
        "login"
    }

    fn description(&self) -> &str {
        "Authenticate with Neptune. Opens a browser window for OAuth login and saves the \
         access token for the other tools."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    fn call(&self, _args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let server = CallbackServer::start(LOGIN_TIMEOUT).map_err(|e| e.to_string())?;
        let url = server.login_url(&ctx.config().api_base_url);
        let browser_opened = open::that(&url).is_ok();
        if !browser_opened {
            tracing::warn!(%url, "could not open browser; open the login URL manually");
        }

        let Some(token) = server.wait() else {
            return Err(format!(
                "Login failed: no access token received. \
                 Open {url} in a browser and try the 'login' tool again."
            ));
        };
        let path = config::default_config_path().map_err(|e| e.to_string())?;
        config::store_access_token(&path, &token).map_err(|e| e.to_string())?;
        ctx.reload_config();

        Ok(serde_json::json!({
            "status": "success",
            "message": "Successfully logged in!",
            "next_step": "You can now use other Neptune tools to deploy and manage your projects."
        }))
    }
}

use super::Ctx;
use crate::output::{CommandResult, Ui};
use base64::Engine;
use clap::Subcommand;
use neptune_core::models::ResourceKind;
use neptune_core::poll::PollPolicy;
use neptune_core::{provision, resources, NeptuneError};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ResourceSubcommand {
    /// Show how to declare and use a resource kind
    Info {
        /// Database, StorageBucket or Secret
        kind: ResourceKind,
    },
    /// Provision the resources declared in neptune.json without deploying
    Provision,
    /// Manage secrets
    Secret {
        #[command(subcommand)]
        subcommand: SecretSubcommand,
    },
    /// Inspect databases
    Database {
        #[command(subcommand)]
        subcommand: DatabaseSubcommand,
    },
    /// Inspect storage buckets
    Bucket {
        #[command(subcommand)]
        subcommand: BucketSubcommand,
    },
}

#[derive(Subcommand)]
pub enum SecretSubcommand {
    /// Set a secret's value (prompts when --value is omitted)
    Set {
        name: String,
        #[arg(long)]
        project_name: Option<String>,
        #[arg(long)]
        value: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DatabaseSubcommand {
    /// Show connection details
    Info {
        name: String,
        #[arg(long)]
        project_name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BucketSubcommand {
    /// List object keys
    List {
        name: String,
        #[arg(long)]
        project_name: Option<String>,
    },
    /// Fetch one object
    Get {
        name: String,
        key: String,
        #[arg(long)]
        project_name: Option<String>,
        /// Save to a file instead of printing
        #[arg(short, long)]
        output_file: Option<PathBuf>,
    },
}

pub fn run(ctx: &Ctx, subcommand: ResourceSubcommand) -> anyhow::Result<()> {
    match subcommand {
        ResourceSubcommand::Info { kind } => info(&ctx.ui, kind),
        ResourceSubcommand::Provision => provision(ctx),
        ResourceSubcommand::Secret {
            subcommand: SecretSubcommand::Set { name, project_name, value },
        } => set_secret(ctx, &name, project_name, value),
        ResourceSubcommand::Database {
            subcommand: DatabaseSubcommand::Info { name, project_name },
        } => database_info(ctx, &name, project_name),
        ResourceSubcommand::Bucket { subcommand } => match subcommand {
            BucketSubcommand::List { name, project_name } => bucket_list(ctx, &name, project_name),
            BucketSubcommand::Get {
                name,
                key,
                project_name,
                output_file,
            } => bucket_get(ctx, &name, &key, project_name, output_file),
        },
    }
}

/// Failure result for a resource lookup, with a next step matching the cause.
fn lookup_failure(err: &NeptuneError, project: &str, fallback: &str) -> CommandResult {
    let (hint, next) = match err {
        NeptuneError::ProjectNotFound(_) => (
            "Make sure the project is provisioned first.".to_string(),
            "neptune resource provision",
        ),
        NeptuneError::ResourceNotFound { kind, .. } => (
            format!("Make sure the {kind} is defined in neptune.json and provisioned."),
            "neptune resource provision",
        ),
        _ => (String::new(), "neptune login"),
    };
    let mut messages = vec![match err {
        NeptuneError::ProjectNotFound(_) | NeptuneError::ResourceNotFound { .. } => err.to_string(),
        _ => format!("{fallback}: {err}"),
    }];
    if !hint.is_empty() {
        messages.push(hint);
    }
    CommandResult::failure(messages, next).with("project", project)
}

fn info(ui: &Ui, kind: ResourceKind) -> anyhow::Result<()> {
    let info = resources::resource_info(kind);
    if ui.is_json() {
        let result = CommandResult::success("neptune resource provision").with("resource", &info);
        return ui.finish(&result);
    }
    ui.header(&format!("{} Resource", info.kind));
    ui.step("", info.description);
    println!();
    ui.step("📝", "neptune.json configuration:");
    println!("{}", info.neptune_json_example);
    println!();
    ui.step("💻", "Code usage:");
    println!("{}", info.code_usage_example);
    Ok(())
}

fn provision(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("Provision Resources");
    let client = ctx.client()?;

    let res = match provision::provision(&client, &ctx.dir, &PollPolicy::PROVISIONING) {
        Ok(r) => r,
        Err(e @ NeptuneError::SpecNotFound(_)) => {
            let result = CommandResult::failure(
                vec![e.to_string(), "Run 'neptune generate spec' to create it first.".into()],
                "neptune generate spec",
            );
            return ui.finish(&result);
        }
        Err(e) => {
            let result = CommandResult::failure(
                vec![format!("Failed to provision resources: {e}")],
                "neptune resource provision",
            );
            return ui.finish(&result);
        }
    };

    ui.success(&format!("Resources provisioned for '{}'", res.project.name));
    if !res.resources.is_empty() {
        ui.step("", "Resources:");
        for r in &res.resources {
            let id = r.aws_id.as_deref().unwrap_or("-");
            ui.step("  •", &format!("{} {} ({}) {id}", r.kind, r.name, r.status));
        }
    }
    ui.info("Run 'neptune deploy' to deploy your application.");

    ui.finish(
        &CommandResult::success("neptune deploy")
            .with("project", &res.project.name)
            .with("created", res.created)
            .with("resources", &res.resources),
    )
}

fn set_secret(
    ctx: &Ctx,
    name: &str,
    project_name: Option<String>,
    value: Option<String>,
) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let project = ctx.project_name(project_name);
    ui.header(&format!("Secret: {name}"));

    let value = match value {
        Some(v) => v,
        None => ui.password(&format!("Value for secret '{name}'"))?,
    };
    let client = ctx.client()?;
    if let Err(e) = resources::set_secret_value(&client, &project, name, &value) {
        return ui.finish(&lookup_failure(&e, &project, "Failed to set secret"));
    }

    ui.success(&format!("Secret '{name}' set successfully"));
    ui.info("Redeploy your application for changes to take effect.");
    ui.finish(
        &CommandResult::success("neptune deploy")
            .with("project", &project)
            .with("secret", name),
    )
}

fn database_info(ctx: &Ctx, name: &str, project_name: Option<String>) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let project = ctx.project_name(project_name);
    let client = ctx.client()?;

    let conn = match resources::get_database_connection_info(&client, &project, name) {
        Ok(c) => c,
        Err(e) => return ui.finish(&lookup_failure(&e, &project, "Failed to get database info")),
    };

    ui.header(&format!("Database: {name}"));
    ui.step("", &format!("Host: {}", conn.host));
    ui.step("", &format!("Port: {}", conn.port));
    ui.step("", &format!("Database: {}", conn.database));
    ui.step("", &format!("Username: {}", conn.username));
    ui.step("", &format!("Password: {}", conn.password));
    ui.step("", &format!("Connection string: {}", conn.connection_string()));
    println!();
    ui.warn("The password token expires after 15 minutes.");
    ui.info("For deployed services, use environment variables instead of hardcoding.");

    ui.finish(
        &CommandResult::success("neptune deploy")
            .with("project", &project)
            .with("database", name)
            .with("connection_string", conn.connection_string())
            .with("connection", &conn),
    )
}

fn bucket_list(ctx: &Ctx, name: &str, project_name: Option<String>) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let project = ctx.project_name(project_name);
    let client = ctx.client()?;

    let keys = match resources::list_bucket_files(&client, &project, name) {
        Ok(k) => k,
        Err(e) => return ui.finish(&lookup_failure(&e, &project, "Failed to list bucket files")),
    };

    ui.header(&format!("Bucket: {name}"));
    if keys.is_empty() {
        ui.info("Bucket is empty");
    } else {
        ui.step("", &format!("Found {} file(s):", keys.len()));
        for key in &keys {
            ui.step("  📄", key);
        }
    }
    ui.finish(
        &CommandResult::success(format!("neptune resource bucket get {name} <key>"))
            .with("project", &project)
            .with("bucket", name)
            .with("files", &keys),
    )
}

fn bucket_get(
    ctx: &Ctx,
    name: &str,
    key: &str,
    project_name: Option<String>,
    output_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let project = ctx.project_name(project_name);
    let client = ctx.client()?;

    let data = match resources::get_bucket_object(&client, &project, name, key) {
        Ok(d) => d,
        Err(e) => return ui.finish(&lookup_failure(&e, &project, "Failed to get object")),
    };

    if let Some(path) = output_file {
        std::fs::write(&path, &data)?;
        ui.success(&format!("Saved to {} ({} bytes)", path.display(), data.len()));
        return ui.finish(
            &CommandResult::success("")
                .with("saved_to", path.display().to_string())
                .with("size", data.len()),
        );
    }

    if !ui.is_json() {
        print!("{}", String::from_utf8_lossy(&data));
        return Ok(());
    }

    let size = data.len();
    let result = match String::from_utf8(data) {
        Ok(text) => CommandResult::success("")
            .with("content", text)
            .with("encoding", "utf-8"),
        Err(e) => CommandResult::success("")
            .with(
                "content_base64",
                base64::engine::general_purpose::STANDARD.encode(e.as_bytes()),
            )
            .with("encoding", "base64"),
    };
    ui.finish(&result.with("size", size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_points_at_provisioning() {
        let err = NeptuneError::ResourceNotFound {
            project: "demo".into(),
            kind: ResourceKind::Secret,
            name: "api-key".into(),
        };
        let r = lookup_failure(&err, "demo", "Failed to set secret");
        assert!(!r.ok);
        assert_eq!(r.next_action_command, "neptune resource provision");
        assert_eq!(r.messages[0], err.to_string());
        assert!(r.messages[1].contains("Secret"));
    }

    #[test]
    fn api_errors_keep_the_context_prefix() {
        let err = NeptuneError::Api {
            status: 401,
            body: "unauthorized".into(),
        };
        let r = lookup_failure(&err, "demo", "Failed to list bucket files");
        assert!(r.messages[0].starts_with("Failed to list bucket files: "));
        assert_eq!(r.messages.len(), 1);
        assert_eq!(r.next_action_command, "neptune login");
    }
}

mod cmd;
mod oauth;
mod output;
mod root;
mod tools;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::{
    generate::GenerateSubcommand, project::ListSubcommand, resource::ResourceSubcommand, Ctx,
};
use neptune_core::deploy::DeployOptions;
use output::{CommandResult, OutputMode, Reported, Ui};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "neptune",
    about = "Deploy projects to the Neptune platform: provision, build, push and run",
    version,
    propagate_version = true
)]
struct Cli {
    /// Verbose logging to stderr
    #[arg(long, global = true, env = "NEPTUNE_DEBUG")]
    debug: bool,

    /// Output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputMode::Normal,
        env = "NEPTUNE_OUTPUT_MODE"
    )]
    output: OutputMode,

    /// Project directory (default: current directory)
    #[arg(long, global = true, visible_alias = "wd")]
    working_directory: Option<PathBuf>,

    /// Show additional detail in normal output
    #[arg(short, long, global = true, env = "NEPTUNE_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a Neptune project, optionally from a git template
    Init {
        /// Project name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,
        /// Clone a template from this git repository URL
        #[arg(long = "from")]
        from: Option<String>,
        /// Path to the template inside the repository
        #[arg(long, requires = "from")]
        subfolder: Option<String>,
        /// Don't initialize a new git repository
        #[arg(long)]
        no_git: bool,
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Generate the spec, provision, build, push and deploy the project
    Deploy {
        /// Use the existing neptune.json instead of regenerating it
        #[arg(long)]
        skip_spec: bool,
        /// Skip AI lint
        #[arg(long)]
        skip_lint: bool,
        /// Don't block on AI lint errors
        #[arg(long)]
        allow_ai_errors: bool,
        /// Don't block on AI lint warnings
        #[arg(long)]
        allow_ai_warnings: bool,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the project's infrastructure and service status
    Status {
        #[arg(long)]
        project_name: Option<String>,
    },

    /// List resources in your account
    List {
        #[command(subcommand)]
        subcommand: ListSubcommand,
    },

    /// Delete the project and all its resources
    Delete {
        #[arg(long)]
        project_name: Option<String>,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Run AI lint on the project
    Lint {
        #[arg(long)]
        allow_ai_errors: bool,
        #[arg(long)]
        allow_ai_warnings: bool,
    },

    /// Generate neptune.json, AGENTS.md or shell completions
    Generate {
        #[command(subcommand)]
        subcommand: GenerateSubcommand,
    },

    /// Show the service's logs
    Logs {
        #[arg(long)]
        project_name: Option<String>,
        /// Keep polling for new lines
        #[arg(short, long)]
        follow: bool,
    },

    /// Print the JSON schema for neptune.json
    Schema,

    /// Inspect and manage project resources
    Resource {
        #[command(subcommand)]
        subcommand: ResourceSubcommand,
    },

    /// Wait until the service is running
    Wait {
        #[arg(long)]
        project_name: Option<String>,
        /// Seconds to wait before giving up
        #[arg(long, default_value_t = cmd::wait::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },

    /// Check for a Dockerfile and show an example for the detected project type
    Dockerfile,

    /// Authenticate with Neptune (browser login, or --api-key)
    Login {
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Remove stored credentials
    Logout,

    /// Start the MCP tool server on stdio
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        match cli.command {
            Commands::Mcp => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };
    // stdout carries command output and MCP responses.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ui = Ui::new(cli.output, cli.verbose);
    if let Err(e) = run(cli, ui) {
        if e.downcast_ref::<Reported>().is_none() {
            if ui.is_json() {
                let _ = output::print_json(&CommandResult::failure(vec![format!("{e:#}")], ""));
            } else {
                eprintln!("error: {e:#}");
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, ui: Ui) -> anyhow::Result<()> {
    let dir = root::resolve_project_dir(cli.working_directory.as_deref())?;
    let ctx = Ctx::new(dir, ui);

    match cli.command {
        Commands::Init {
            name,
            from,
            subfolder,
            no_git,
            path,
        } => cmd::init::run(
            &ctx,
            cmd::init::InitArgs {
                name,
                from,
                subfolder,
                no_git,
                path,
            },
        ),
        Commands::Deploy {
            skip_spec,
            skip_lint,
            allow_ai_errors,
            allow_ai_warnings,
            yes,
        } => cmd::deploy::run(
            &ctx,
            DeployOptions {
                skip_spec,
                skip_lint,
                allow_ai_errors,
                allow_ai_warnings,
            },
            yes,
        ),
        Commands::Status { project_name } => cmd::project::status(&ctx, project_name),
        Commands::List { subcommand } => cmd::project::list(&ctx, subcommand),
        Commands::Delete { project_name, yes } => cmd::project::delete(&ctx, project_name, yes),
        Commands::Lint {
            allow_ai_errors,
            allow_ai_warnings,
        } => cmd::lint::run(&ctx, allow_ai_errors, allow_ai_warnings),
        Commands::Generate { subcommand } => match subcommand {
            GenerateSubcommand::Spec => cmd::generate::spec(&ctx),
            GenerateSubcommand::Agents => cmd::generate::agents(&ctx),
            GenerateSubcommand::Shell { shell, output_file } => {
                cmd::generate::shell(&mut Cli::command(), shell, output_file)
            }
        },
        Commands::Logs {
            project_name,
            follow,
        } => cmd::logs::run(&ctx, project_name, follow),
        Commands::Schema => cmd::schema::run(&ctx),
        Commands::Resource { subcommand } => cmd::resource::run(&ctx, subcommand),
        Commands::Wait {
            project_name,
            timeout,
        } => cmd::wait::run(&ctx, project_name, timeout),
        Commands::Dockerfile => cmd::dockerfile::run(&ctx),
        Commands::Login { api_key } => cmd::auth::login(&ctx, api_key),
        Commands::Logout => cmd::auth::logout(&ctx),
        Commands::Mcp => cmd::mcp::run(&tools::ToolCtx::new(ctx.dir.clone(), ctx.config.clone())),
    }
}

/*!
 * jujuctl - command-line client for the Juju controller API
 */

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jujulib::{
    cli_style,
    commands,
    config::{ClientConfig, LogLevel},
    error::{CliError, EXIT_FATAL, EXIT_SUCCESS},
    logging, OutputWriter,
};
use jujulib_connect::ModelOptions;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "jujuctl")]
#[command(version, about = "Talk to a Juju controller: log in, list, inspect, create and destroy models", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/jujuctl/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Controller address, `host:port` or a `wss://` URL
    #[arg(long, env = "JUJU_CONTROLLER", global = true)]
    controller: Option<String>,

    /// User to log in as
    #[arg(short, long, env = "JUJU_USER", global = true)]
    user: Option<String>,

    /// Password for --user
    #[arg(long, env = "JUJU_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// JSON file with discharged macaroons to log in with
    #[arg(long, value_name = "FILE", global = true)]
    macaroons: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write logs to a file as JSON
    #[arg(long = "log", value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Verbose logging (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Seconds to wait for the controller
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the controller answers
    Ping,

    /// Show the facades and versions the controller offers
    Facades,

    /// Model operations
    #[command(subcommand)]
    Models(ModelsCommand),
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List models
    List {
        /// Owner whose models to list (default: the logged-in user)
        #[arg(long)]
        owner: Option<String>,

        /// Fetch full details for each model
        #[arg(long)]
        info: bool,
    },

    /// Show details for models
    Info {
        /// Model tags (`model-<uuid>`) or uuids
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Create a model
    Create(CreateArgs),

    /// Destroy models
    Destroy {
        /// Model tags (`model-<uuid>`) or uuids
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

#[derive(Args)]
struct CreateArgs {
    name: String,

    /// Owner of the new model (default: the logged-in user)
    #[arg(long)]
    owner: Option<String>,

    /// Cloud name or tag, e.g. `aws` or `cloud-aws`
    #[arg(long)]
    cloud: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Cloud credential tag
    #[arg(long)]
    credential: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

/// File values first, then flags and environment on top
fn resolve_config(cli: &Cli, out: &OutputWriter) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ClientConfig::load_default().unwrap_or_else(|e| {
            out.warning(&format!("Ignoring default config file: {}", e));
            ClientConfig::default()
        }),
    };

    if cli.controller.is_some() {
        config.controller = cli.controller.clone();
    }
    if cli.user.is_some() {
        config.user = cli.user.clone();
    }
    if cli.password.is_some() {
        config.password = cli.password.clone();
    }
    if cli.macaroons.is_some() {
        config.macaroons_file = cli.macaroons.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = secs;
    }
    config.verbose |= cli.verbose;

    Ok(config)
}

fn cloud_tag(cloud: String) -> String {
    if cloud.starts_with("cloud-") {
        cloud
    } else {
        format!("cloud-{}", cloud)
    }
}

async fn run(cli: Cli, out: &OutputWriter) -> anyhow::Result<()> {
    let config = resolve_config(&cli, out)?;
    logging::init_logging(&config)?;
    debug!("Resolved configuration for {:?}", config.controller);

    let limit = config.request_timeout();
    let api = commands::with_timeout(limit, commands::connect(&config)).await?;

    let result = commands::with_timeout(limit, async {
        match cli.command {
            Commands::Ping => commands::ping(&api, out).await,
            Commands::Facades => commands::facades(&api, out).await,
            Commands::Models(ModelsCommand::List { owner, info }) => {
                commands::list_models(&api, out, owner.as_deref(), info).await
            }
            Commands::Models(ModelsCommand::Info { tags }) => {
                commands::model_info(&api, out, &tags).await
            }
            Commands::Models(ModelsCommand::Create(args)) => {
                let options = ModelOptions {
                    config: None,
                    cloud_tag: args.cloud.map(cloud_tag),
                    region: args.region,
                    credential: args.credential,
                };
                commands::create_model(&api, out, &args.name, args.owner.as_deref(), options)
                    .await
            }
            Commands::Models(ModelsCommand::Destroy { tags }) => {
                commands::destroy_models(&api, out, &tags).await
            }
        }
    })
    .await;

    api.close().await;
    Ok(result?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let out = OutputWriter::new(cli.json);

    let code = match run(cli, &out).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => match e.downcast_ref::<CliError>() {
            Some(err) => {
                out.error(err);
                err.exit_code()
            }
            None => {
                cli_style::print_error(&format!("{:#}", e), None);
                EXIT_FATAL
            }
        },
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cloud_tag_prefix() {
        assert_eq!(cloud_tag("aws".to_string()), "cloud-aws");
        assert_eq!(cloud_tag("cloud-lxd".to_string()), "cloud-lxd");
    }

    #[test]
    fn test_parse_models_destroy() {
        let cli = Cli::try_parse_from(["jujuctl", "models", "destroy", "model-a", "b", "--json"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Models(ModelsCommand::Destroy { tags }) => assert_eq!(tags, ["model-a", "b"]),
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_destroy_requires_a_model() {
        assert!(Cli::try_parse_from(["jujuctl", "models", "destroy"]).is_err());
    }
}

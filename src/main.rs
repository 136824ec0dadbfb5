use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use ghtkn::cli::get::{
    parse_min_expiration, resolve_config_path, run_get, run_git_credential, GetOptions,
};
use ghtkn::cli::init::run_init;
use ghtkn::cli::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "ghtkn",
    version,
    about = "Create GitHub App user access tokens for local development"
)]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(long, global = true, env = "GHTKN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GHTKN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output a GitHub App user access token to stdout
    Get {
        /// App id to use instead of the default app
        #[arg(env = "GHTKN_APP")]
        app: Option<String>,

        /// Output format (json)
        #[arg(short, long, env = "GHTKN_OUTPUT_FORMAT", default_value = "")]
        format: String,

        /// Minimum remaining lifetime of a cached token (e.g. 1h, 30m, 30s)
        #[arg(short, long, env = "GHTKN_MIN_EXPIRATION", default_value = "")]
        min_expiration: String,
    },

    /// Git credential helper
    #[command(name = "git-credential")]
    GitCredential {
        /// Operation passed by git (get, store, erase)
        operation: Option<String>,

        /// Minimum remaining lifetime of a cached token (e.g. 1h, 30m, 30s)
        #[arg(short, long, env = "GHTKN_MIN_EXPIRATION", default_value = "")]
        min_expiration: String,
    },

    /// Create the configuration file if it doesn't exist
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    ghtkn::logging::init(cli.log_level.as_deref());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let span = tracing::info_span!("ghtkn", version = env!("CARGO_PKG_VERSION"));
    if let Err(e) = run(cli, cancel).instrument(span).await {
        tracing::debug!(code = e.code(), "ghtkn failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), ghtkn::GhtknError> {
    match cli.command {
        Commands::Get {
            app,
            format,
            min_expiration,
        } => {
            let format: OutputFormat = format.parse()?;
            let opts = GetOptions {
                config: cli.config,
                app: app.filter(|a| !a.is_empty()),
                min_expiration: parse_min_expiration(&min_expiration)?,
            };
            let manager = ghtkn::TokenManager::with_defaults();
            let mut out = Vec::new();
            run_get(&manager, &cancel, &opts, format, &mut out).await?;
            std::io::stdout().write_all(&out)?;
            Ok(())
        }
        Commands::GitCredential {
            operation,
            min_expiration,
        } => {
            let opts = GetOptions {
                config: cli.config,
                app: std::env::var("GHTKN_APP").ok().filter(|a| !a.is_empty()),
                min_expiration: parse_min_expiration(&min_expiration)?,
            };
            let manager = ghtkn::TokenManager::with_defaults();
            let stdin = BufReader::new(tokio::io::stdin());
            let mut out = Vec::new();
            run_git_credential(
                &manager,
                &cancel,
                &opts,
                operation.as_deref().unwrap_or_default(),
                stdin,
                &mut out,
            )
            .await?;
            std::io::stdout().write_all(&out)?;
            Ok(())
        }
        Commands::Init => {
            let path = resolve_config_path(cli.config)?;
            run_init(&path)
        }
    }
}

//! aarsync - Android archive dependency resolver
//!
//! CLI entry point that dispatches to subcommands.

use aarsync::cli::args::LogFormat;
use aarsync::cli::commands::ProjectContext;
use aarsync::cli::{Cli, Commands};
use aarsync::config::ConfigManager;
use aarsync::error::{AarsyncError, AarsyncResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, format: LogFormat) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("aarsync=warn"),
        1 => EnvFilter::new("aarsync=info"),
        _ => EnvFilter::new("aarsync=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run() -> AarsyncResult<()> {
    let cli = Cli::parse();
    aarsync::ui::init_theme();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        init_logging(cli.verbose, cli.log_format.unwrap_or(LogFormat::Text));
        return aarsync::cli::commands::init(args).await;
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let cwd = std::env::current_dir().map_err(|e| AarsyncError::io("getting current directory", e))?;
    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    let log_format = cli.log_format.unwrap_or(match config.general.log_format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(cli.verbose, log_format);

    if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
    } else if let Some(ref path) = local_config_path {
        debug!("Found local config: {}", path.display());
    }

    let project = ProjectContext::new(config, config_manager, local_config_path, cwd);

    // Dispatch to command
    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Resolve(args) => aarsync::cli::commands::resolve(args, &project).await,
        Commands::Deps(args) => aarsync::cli::commands::deps(args, &project).await,
        Commands::Check => aarsync::cli::commands::check(&project).await,
        Commands::Conflicts(args) => aarsync::cli::commands::conflicts(args, &project).await,
        Commands::Cache(args) => aarsync::cli::commands::cache(args, &project).await,
        Commands::Config(args) => aarsync::cli::commands::config(args, &project).await,
        Commands::Status => aarsync::cli::commands::status(&project).await,
    }
}

//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// aarsync - Android archive dependency resolver
///
/// Merges dependency declarations, fetches artifacts through Gradle and
/// prepares them for Android packaging.
#[derive(Parser, Debug)]
#[command(name = "aarsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AARSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .aarsync.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Log output format (overrides general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a project-local .aarsync.toml config
    Init(InitArgs),

    /// Fetch and process every declared dependency
    Resolve(ResolveArgs),

    /// Show the merged dependency request without fetching
    Deps(DepsArgs),

    /// List cached artifacts whose build settings went stale
    Check,

    /// Detect duplicate managed and unmanaged artifacts
    Conflicts(ConflictsArgs),

    /// Inspect or clear the explode cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Check SDK, build tool and cache health
    Status,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .aarsync.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Reprocess every managed artifact, not only fetched ones
    #[arg(short, long)]
    pub force: bool,

    /// Auto-approve removal of older duplicates
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the deps command
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the conflicts command
#[derive(Parser, Debug)]
pub struct ConflictsArgs {
    /// Auto-approve removal of older duplicates
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., android.sdk_root)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .aarsync.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached explode decisions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the cache file location
    Path,

    /// Delete the cache file
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_resolve() {
        let cli = Cli::parse_from(["aarsync", "resolve", "--force", "--yes"]);
        match cli.command {
            Commands::Resolve(args) => {
                assert!(args.force);
                assert!(args.yes);
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn cli_parses_status() {
        let cli = Cli::parse_from(["aarsync", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parses_deps_format() {
        let cli = Cli::parse_from(["aarsync", "deps", "--format", "json"]);
        match cli.command {
            Commands::Deps(args) => assert!(matches!(args.format, OutputFormat::Json)),
            _ => panic!("expected Deps command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["aarsync", "cache", "clear", "-y"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { yes },
            }) => assert!(yes),
            _ => panic!("expected cache clear"),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["aarsync", "config", "set", "android.sdk_root", "/opt/sdk"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value, local }),
            }) => {
                assert_eq!(key, "android.sdk_root");
                assert_eq!(value, "/opt/sdk");
                assert!(!local);
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn cli_parses_init_force() {
        let cli = Cli::parse_from(["aarsync", "init", "--force"]);
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from(["aarsync", "--no-local", "--log-format", "json", "check"]);
        assert!(cli.no_local);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["aarsync", "status"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["aarsync", "-v", "status"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["aarsync", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }
}

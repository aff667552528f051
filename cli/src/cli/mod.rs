mod daemon;

pub use daemon::DaemonCommands;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the battery monitor in the foreground (default)
    Run,

    /// Turn notifications on or off in the running daemon
    Toggle,

    /// Show what the running daemon last saw
    Status {
        /// Print the raw status as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Take one reading and show what would be notified
    Check,

    /// Manage the background daemon
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Show or edit the config file
    Config {
        /// Print the config file path
        #[arg(long)]
        path: bool,

        /// Overwrite the config with defaults
        #[arg(long)]
        reset: bool,

        /// Open the config in $EDITOR
        #[arg(short, long)]
        edit: bool,
    },

    /// Show recent log output
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,

        /// Keep following the log
        #[arg(short, long)]
        follow: bool,
    },
}

/// Battery level notifications for Linux desktops.
#[derive(Debug, Parser)]
#[command(name = "batteryind", version, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the configured log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::parse_from(["batteryind"]);
        assert!(cli.command.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_global_log_level_after_subcommand() {
        let cli = Cli::parse_from(["batteryind", "status", "--json", "--log-level", "debug"]);
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_daemon_start_foreground() {
        let cli = Cli::parse_from(["batteryind", "daemon", "start", "-f"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Daemon {
                command: DaemonCommands::Start { foreground: true }
            })
        ));
    }

    #[test]
    fn test_logs_defaults() {
        let cli = Cli::parse_from(["batteryind", "logs"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Logs {
                lines: 50,
                follow: false
            })
        ));
    }
}

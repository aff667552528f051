use color_eyre::eyre::{eyre, Result};

use crate::cli::DaemonCommands;
use crate::commands::status;
use crate::config::{LogLevel, UserConfig};
use crate::daemon::{is_daemon_running, run_daemon, socket_path, DaemonClient};
use crate::logging::{self, LogMode};

pub fn run(
    command: DaemonCommands,
    config: &UserConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    match command {
        DaemonCommands::Start { foreground: true } => run_foreground(config, log_level_override),
        DaemonCommands::Start { foreground: false } => {
            if is_daemon_running() {
                println!("Daemon is already running.");
                return Ok(());
            }

            println!("Starting daemon...");
            println!("Socket: {:?}", socket_path());
            println!("Check it with `batteryind daemon status` or `batteryind logs`.");
            // The launching process exits inside daemonize; only the daemon returns.
            run_daemon(config, false, log_level_override)
                .map_err(|e| eyre!("{}", e))
        }
        DaemonCommands::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running.");
                return Ok(());
            }

            let mut client =
                DaemonClient::connect().map_err(|e| eyre!("Failed to connect to daemon: {}", e))?;
            client.shutdown()?;
            println!("Daemon stopped.");
            Ok(())
        }
        DaemonCommands::Status => {
            println!("Daemon Status");
            println!("{}", "-".repeat(40));

            if !is_daemon_running() {
                println!("Running:       no");
                return Ok(());
            }

            let mut client =
                DaemonClient::connect().map_err(|e| eyre!("Failed to connect to daemon: {}", e))?;
            let status = client.get_status()?;
            println!("Running:       yes");
            println!("Socket:        {:?}", socket_path());
            for line in status::describe(&status) {
                println!("{line}");
            }
            if let Err(e) = crate::daemon::check_version_compatibility(&status) {
                println!();
                println!("{e}");
            }
            Ok(())
        }
    }
}

/// Runs the monitor attached to the terminal until Ctrl+C.
pub fn run_foreground(config: &UserConfig, log_level_override: Option<LogLevel>) -> Result<()> {
    if is_daemon_running() {
        println!("Daemon is already running.");
        return Ok(());
    }

    let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
    println!("Watching battery in the foreground...");
    println!("Press Ctrl+C to stop.");
    run_daemon(config, true, log_level_override).map_err(|e| eyre!("{}", e))
}

mod cli;
mod commands;
mod config;
mod daemon;
mod engine;
mod logging;
mod monitor;
mod notifier;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Some(Commands::Toggle) => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::toggle::run()
        }
        Some(Commands::Status { json }) => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::status::run(json)
        }
        Some(Commands::Check) => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::check::run(&config)
        }
        Some(Commands::Config { path, reset, edit }) => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::config::run(&config, path, reset, edit)
        }
        Some(Commands::Logs { lines, follow }) => commands::logs::run(lines, follow),
        Some(Commands::Daemon { command }) => {
            commands::daemon::run(command, &config, log_level_override)
        }
        Some(Commands::Run) | None => {
            commands::daemon::run_foreground(&config, log_level_override)
        }
    }
}

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DaemonCommands {
    /// Start the daemon (detaches unless --foreground)
    Start {
        #[arg(short, long)]
        foreground: bool,
    },

    /// Ask the running daemon to exit
    Stop,

    /// Show whether the daemon is running
    Status,
}

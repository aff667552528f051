use color_eyre::eyre::{eyre, Result};

use crate::daemon::{is_daemon_running, DaemonClient};

pub fn run() -> Result<()> {
    if !is_daemon_running() {
        return Err(eyre!(
            "Daemon is not running. Start it with `batteryind daemon start`."
        ));
    }

    let mut client = DaemonClient::connect_with_version_check()?;
    let event = client.toggle()?;
    tracing::debug!(?event, "Toggled notifications");

    println!("{}", event.title());
    println!("{}", event.body());
    Ok(())
}

use std::time::Duration;

use batteryind_protocol::DaemonStatus;
use color_eyre::eyre::{eyre, Result};

use crate::daemon::{is_daemon_running, DaemonClient};

pub fn run(json: bool) -> Result<()> {
    if !is_daemon_running() {
        return Err(eyre!(
            "Daemon is not running. Start it with `batteryind daemon start`."
        ));
    }

    let mut client = DaemonClient::connect_with_version_check()?;
    let status = client.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for line in describe(&status) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Human-readable lines for a daemon status report.
pub fn describe(status: &DaemonStatus) -> Vec<String> {
    let mut lines = vec![
        format!("Version:       {}", status.version),
        format!(
            "Uptime:        {}",
            humantime::format_duration(Duration::from_secs(status.uptime_secs))
        ),
        format!(
            "Notifications: {}",
            if status.notify_enabled { "on" } else { "off" }
        ),
        format!("Polls:         {}", status.polls),
        format!("Sent:          {}", status.notifications_sent),
    ];

    match &status.last_reading {
        Some(reading) => {
            let charging = if reading.is_charging {
                "charging"
            } else {
                "not charging"
            };
            lines.push(format!(
                "Battery:       {}% ({})",
                reading.level_percent, charging
            ));
            if let Some(at) = chrono::DateTime::from_timestamp(reading.taken_at, 0) {
                lines.push(format!("Read at:       {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
            }
        }
        None => lines.push("Battery:       no reading yet".to_string()),
    }

    if let Some(event) = status.last_event {
        lines.push(format!("Last event:    {}", event.title()));
    }

    lines
}

#[cfg(test)]
mod tests {
    use batteryind_protocol::{NotificationEvent, ReadingSnapshot};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_describe_fresh_daemon() {
        let status = DaemonStatus {
            version: "0.3.0".to_string(),
            uptime_secs: 5,
            notify_enabled: true,
            ..DaemonStatus::default()
        };

        assert_eq!(
            describe(&status),
            vec![
                "Version:       0.3.0",
                "Uptime:        5s",
                "Notifications: on",
                "Polls:         0",
                "Sent:          0",
                "Battery:       no reading yet",
            ]
        );
    }

    #[test]
    fn test_describe_with_reading_and_event() {
        let status = DaemonStatus {
            version: "0.3.0".to_string(),
            uptime_secs: 3725,
            notify_enabled: false,
            polls: 124,
            notifications_sent: 3,
            last_reading: Some(ReadingSnapshot {
                level_percent: 85,
                is_charging: true,
                taken_at: 0,
            }),
            last_event: Some(NotificationEvent::BatteryFull),
            ..DaemonStatus::default()
        };

        let lines = describe(&status);
        assert_eq!(lines[1], "Uptime:        1h 2m 5s");
        assert_eq!(lines[2], "Notifications: off");
        assert_eq!(lines[5], "Battery:       85% (charging)");
        assert_eq!(lines[6], "Read at:       1970-01-01 00:00:00 UTC");
        assert_eq!(
            lines[7],
            format!("Last event:    {}", NotificationEvent::BatteryFull.title())
        );
    }
}

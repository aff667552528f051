use serde::{Deserialize, Serialize};

use crate::version::{MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};

/// A user-facing event decided by the notification engine.
///
/// Produced and handed straight to the presentation layer; never retained
/// beyond the daemon's "last event" status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    LowBattery,
    BatteryFull,
    NotificationsEnabled,
    NotificationsDisabled,
}

impl NotificationEvent {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationEvent::LowBattery => "Battery Low",
            NotificationEvent::BatteryFull => "Battery Full",
            NotificationEvent::NotificationsEnabled
            | NotificationEvent::NotificationsDisabled => "Battery Notifier",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            NotificationEvent::LowBattery => {
                "Battery level is below 40%. Please plug in your charger."
            }
            NotificationEvent::BatteryFull => {
                "Battery level is above 80%. Please consider unplugging."
            }
            NotificationEvent::NotificationsEnabled => "Notifications enabled",
            NotificationEvent::NotificationsDisabled => "Notifications disabled",
        }
    }

    /// True for battery threshold events, false for toggle confirmations.
    pub fn is_threshold(&self) -> bool {
        matches!(
            self,
            NotificationEvent::LowBattery | NotificationEvent::BatteryFull
        )
    }

    /// The toggle confirmation for the given enabled flag.
    pub fn for_enabled(enabled: bool) -> Self {
        if enabled {
            NotificationEvent::NotificationsEnabled
        } else {
            NotificationEvent::NotificationsDisabled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReadingSnapshot {
    pub level_percent: u8,
    pub is_charging: bool,
    /// Unix timestamp of the poll that produced this reading.
    pub taken_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub version: String,
    pub uptime_secs: u64,
    pub notify_enabled: bool,
    pub polls: u64,
    pub notifications_sent: u64,
    pub last_reading: Option<ReadingSnapshot>,
    #[serde(default)]
    pub last_event: Option<NotificationEvent>,
    pub protocol_version: u32,
    pub min_supported_version: u32,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: String::new(),
            uptime_secs: 0,
            notify_enabled: true,
            polls: 0,
            notifications_sent: 0,
            last_reading: None,
            last_event: None,
            protocol_version: PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
        }
    }
}

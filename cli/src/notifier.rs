//! Delivery of notification events to the user.
//!
//! Delivery is best-effort: callers log a failed [`Notifier::notify`] and move
//! on, nothing is retried or acknowledged.

use batteryind_protocol::NotificationEvent;
use notify_rust::Notification;
#[cfg(all(unix, not(target_os = "macos")))]
use notify_rust::Urgency;

use crate::config::NotifierKind;

const APP_NAME: &str = "batteryind";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Desktop notification failed: {0}")]
    Desktop(#[from] notify_rust::error::Error),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

pub fn from_kind(kind: NotifierKind) -> Box<dyn Notifier> {
    match kind {
        NotifierKind::Desktop => Box::new(DesktopNotifier),
        NotifierKind::Log => Box::new(LogNotifier),
    }
}

/// Freedesktop notifications over D-Bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let mut notification = Notification::new();
        notification
            .appname(APP_NAME)
            .summary(event.title())
            .body(event.body())
            .icon(icon_name(event));

        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(if is_urgent(event) {
            Urgency::Critical
        } else {
            Urgency::Normal
        });

        notification.show()?;
        Ok(())
    }
}

/// Writes events to the log instead of the desktop, for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event = ?event,
            title = event.title(),
            body = event.body(),
            "Notification"
        );
        Ok(())
    }
}

fn icon_name(event: &NotificationEvent) -> &'static str {
    match event {
        NotificationEvent::LowBattery => "battery-caution",
        NotificationEvent::BatteryFull => "battery-full-charged",
        NotificationEvent::NotificationsEnabled => "notification-active",
        NotificationEvent::NotificationsDisabled => "notification-disabled",
    }
}

fn is_urgent(event: &NotificationEvent) -> bool {
    matches!(event, NotificationEvent::LowBattery)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every delivered event.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingNotifier {
        events: Arc<Mutex<Vec<NotificationEvent>>>,
    }

    impl RecordingNotifier {
        pub fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
            self.events.lock().unwrap().push(*event);
            Ok(())
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::types::{DaemonStatus, NotificationEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DaemonResponse {
    Status(DaemonStatus),
    /// Carries the enabled/disabled event produced by the toggle.
    Toggled(NotificationEvent),
    Ok,
    Error(String),
}

impl DaemonResponse {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

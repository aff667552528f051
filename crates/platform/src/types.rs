//! Shared types for battery state sampling.

use std::fmt;

/// Charging state as reported by the `state:` line of `upower -i`.
///
/// Only the first word of the value is considered, so `fully-charged`
/// arrives here as `fully` and `pending-charge` as `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeState {
    /// Battery is actively charging
    Charging,
    /// Battery is discharging (on battery power)
    Discharging,
    /// Battery is full
    Full,
    /// External power connected but not charging (e.g., charge threshold reached)
    Pending,
    /// Battery is empty
    Empty,
    /// State cannot be determined
    #[default]
    Unknown,
}

impl ChargeState {
    /// Maps a `state:` token to a charge state. Matching is exact, the same way
    /// upower prints it.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "charging" => ChargeState::Charging,
            "discharging" => ChargeState::Discharging,
            "fully" => ChargeState::Full,
            "pending" => ChargeState::Pending,
            "empty" => ChargeState::Empty,
            _ => ChargeState::Unknown,
        }
    }

    /// Returns a human-readable label for the charge state.
    pub fn label(&self) -> &'static str {
        match self {
            ChargeState::Charging => "Charging",
            ChargeState::Discharging => "On Battery",
            ChargeState::Full => "Full",
            ChargeState::Pending => "Not Charging",
            ChargeState::Empty => "Empty",
            ChargeState::Unknown => "Unknown",
        }
    }

    /// Returns true only when the battery is actively charging.
    pub fn is_charging(&self) -> bool {
        matches!(self, ChargeState::Charging)
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

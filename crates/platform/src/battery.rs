//! Battery reading type and the reader trait.

use std::fmt;

/// A single sampled (level, charging) pair.
///
/// Produced fresh on every poll. Any failure to sample the power subsystem
/// yields [`BatteryReading::FALLBACK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryReading {
    /// Charge level as a percentage (0-100).
    pub level_percent: u8,

    /// Whether the battery is actively charging.
    pub is_charging: bool,
}

impl BatteryReading {
    /// Neutral reading used whenever the power subsystem can't be sampled.
    pub const FALLBACK: BatteryReading = BatteryReading {
        level_percent: 0,
        is_charging: false,
    };

    pub fn new(level_percent: u8, is_charging: bool) -> Self {
        Self {
            level_percent: level_percent.min(100),
            is_charging,
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

impl fmt::Display for BatteryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_charging {
            "charging"
        } else {
            "not charging"
        };
        write!(f, "{}% ({})", self.level_percent, state)
    }
}

/// Source of battery readings.
///
/// Implementations are total: every failure is absorbed and reported as
/// [`BatteryReading::FALLBACK`] so a poll cycle never fails.
pub trait PowerStateReader: Send + Sync {
    fn read(&self) -> BatteryReading;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_default() {
        assert_eq!(BatteryReading::default(), BatteryReading::FALLBACK);
        assert!(BatteryReading::default().is_fallback());
        assert!(!BatteryReading::new(0, true).is_fallback());
    }

    #[test]
    fn test_new_clamps_level() {
        assert_eq!(BatteryReading::new(250, false).level_percent, 100);
        assert_eq!(BatteryReading::new(42, false).level_percent, 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(BatteryReading::new(85, true).to_string(), "85% (charging)");
        assert_eq!(
            BatteryReading::new(12, false).to_string(),
            "12% (not charging)"
        );
    }
}

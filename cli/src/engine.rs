use batteryind_platform::BatteryReading;
use batteryind_protocol::NotificationEvent;

/// Minimum time between two battery notifications, of either kind.
pub const COOLDOWN_SECS: f64 = 30.0;

/// Discharging below this level triggers [`NotificationEvent::LowBattery`].
pub const LOW_BATTERY_PERCENT: u8 = 40;

/// Charging at or above this level triggers [`NotificationEvent::BatteryFull`].
pub const FULL_BATTERY_PERCENT: u8 = 80;

/// Mutable session state, owned by [`NotificationDecisionEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub notify_enabled: bool,
    /// Monotonic seconds of the last battery notification; `None` until the
    /// first one, so the first qualifying reading is never held back.
    pub last_notification_secs: Option<f64>,
    /// Charging flag of the reading that produced the last notification.
    pub last_charging_state: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            notify_enabled: true,
            last_notification_secs: None,
            last_charging_state: false,
        }
    }
}

/// Decides when a reading is worth a notification.
///
/// One shared cooldown covers both battery events: a low-battery alert holds
/// back a battery-full alert (and vice versa) until [`COOLDOWN_SECS`] pass.
#[derive(Debug, Default)]
pub struct NotificationDecisionEngine {
    state: EngineState,
}

impl NotificationDecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.notify_enabled
    }

    /// Processes a fresh reading taken at `now_secs` (monotonic seconds).
    pub fn on_poll(&mut self, reading: BatteryReading, now_secs: f64) -> Option<NotificationEvent> {
        if !self.state.notify_enabled || self.in_cooldown(now_secs) {
            return None;
        }

        let event = decide(reading)?;
        self.state.last_notification_secs = Some(now_secs);
        self.state.last_charging_state = reading.is_charging;
        Some(event)
    }

    /// Flips the enabled flag. Cooldown and charging memory are left alone.
    pub fn toggle(&mut self) -> NotificationEvent {
        self.state.notify_enabled = !self.state.notify_enabled;
        NotificationEvent::for_enabled(self.state.notify_enabled)
    }

    fn in_cooldown(&self, now_secs: f64) -> bool {
        self.state
            .last_notification_secs
            .is_some_and(|last| now_secs - last < COOLDOWN_SECS)
    }
}

/// Threshold rules, in priority order. Charging and discharging are exclusive,
/// so at most one rule can match.
pub fn decide(reading: BatteryReading) -> Option<NotificationEvent> {
    if reading.level_percent < LOW_BATTERY_PERCENT && !reading.is_charging {
        Some(NotificationEvent::LowBattery)
    } else if reading.level_percent >= FULL_BATTERY_PERCENT && reading.is_charging {
        Some(NotificationEvent::BatteryFull)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low() -> BatteryReading {
        BatteryReading::new(39, false)
    }

    fn full() -> BatteryReading {
        BatteryReading::new(85, true)
    }

    #[test]
    fn test_low_battery_emits_once_and_records_time() {
        let mut engine = NotificationDecisionEngine::new();

        assert_eq!(
            engine.on_poll(low(), 100.0),
            Some(NotificationEvent::LowBattery)
        );
        assert_eq!(engine.state().last_notification_secs, Some(100.0));
        assert!(!engine.state().last_charging_state);
        assert_eq!(engine.on_poll(low(), 100.0), None);
    }

    #[test]
    fn test_battery_full_emits() {
        let mut engine = NotificationDecisionEngine::new();

        assert_eq!(
            engine.on_poll(full(), 100.0),
            Some(NotificationEvent::BatteryFull)
        );
        assert_eq!(engine.state().last_notification_secs, Some(100.0));
        assert!(engine.state().last_charging_state);
    }

    #[test]
    fn test_first_poll_is_not_held_back() {
        let mut engine = NotificationDecisionEngine::new();
        assert_eq!(
            engine.on_poll(low(), 0.0),
            Some(NotificationEvent::LowBattery)
        );
    }

    #[test]
    fn test_mid_range_is_quiet() {
        let mut engine = NotificationDecisionEngine::new();

        assert_eq!(engine.on_poll(BatteryReading::new(50, false), 100.0), None);
        assert_eq!(engine.on_poll(BatteryReading::new(50, true), 100.0), None);
        assert_eq!(engine.state(), &EngineState::default());
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(decide(BatteryReading::new(40, false)), None);
        assert_eq!(
            decide(BatteryReading::new(39, false)),
            Some(NotificationEvent::LowBattery)
        );
        assert_eq!(decide(BatteryReading::new(39, true)), None);
        assert_eq!(decide(BatteryReading::new(79, true)), None);
        assert_eq!(
            decide(BatteryReading::new(80, true)),
            Some(NotificationEvent::BatteryFull)
        );
        assert_eq!(decide(BatteryReading::new(100, false)), None);
    }

    #[test]
    fn test_fallback_reading_counts_as_low() {
        assert_eq!(
            decide(BatteryReading::FALLBACK),
            Some(NotificationEvent::LowBattery)
        );
    }

    #[test]
    fn test_cooldown_window() {
        let mut engine = NotificationDecisionEngine::new();
        let t = 1_000.0;

        assert_eq!(engine.on_poll(low(), t), Some(NotificationEvent::LowBattery));
        assert_eq!(engine.on_poll(low(), t + 29.0), None);
        assert_eq!(engine.state().last_notification_secs, Some(t));
        assert_eq!(
            engine.on_poll(low(), t + 31.0),
            Some(NotificationEvent::LowBattery)
        );
        assert_eq!(engine.state().last_notification_secs, Some(t + 31.0));
    }

    #[test]
    fn test_cooldown_ends_exactly_at_boundary() {
        let mut engine = NotificationDecisionEngine::new();

        engine.on_poll(low(), 10.0);
        assert_eq!(
            engine.on_poll(low(), 10.0 + COOLDOWN_SECS),
            Some(NotificationEvent::LowBattery)
        );
    }

    #[test]
    fn test_cooldown_is_shared_between_kinds() {
        let mut engine = NotificationDecisionEngine::new();

        assert_eq!(engine.on_poll(low(), 0.0), Some(NotificationEvent::LowBattery));
        assert_eq!(engine.on_poll(full(), 20.0), None);
        assert_eq!(
            engine.on_poll(full(), 30.0),
            Some(NotificationEvent::BatteryFull)
        );
    }

    #[test]
    fn test_clock_going_backwards_never_rewinds_cooldown() {
        let mut engine = NotificationDecisionEngine::new();

        engine.on_poll(low(), 500.0);
        assert_eq!(engine.on_poll(low(), 400.0), None);
        assert_eq!(engine.state().last_notification_secs, Some(500.0));
    }

    #[test]
    fn test_disabled_engine_is_silent_and_untouched() {
        let mut engine = NotificationDecisionEngine::new();
        engine.toggle();
        let before = engine.state().clone();

        for (reading, now) in [(low(), 0.0), (full(), 100.0), (low(), 1e6)] {
            assert_eq!(engine.on_poll(reading, now), None);
        }
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut engine = NotificationDecisionEngine::new();
        assert!(engine.is_enabled());

        assert_eq!(engine.toggle(), NotificationEvent::NotificationsDisabled);
        assert!(!engine.is_enabled());
        assert_eq!(engine.toggle(), NotificationEvent::NotificationsEnabled);
        assert!(engine.is_enabled());
    }

    #[test]
    fn test_toggle_keeps_cooldown_and_charging_memory() {
        let mut engine = NotificationDecisionEngine::new();
        engine.on_poll(full(), 50.0);

        engine.toggle();
        engine.toggle();

        assert_eq!(engine.state().last_notification_secs, Some(50.0));
        assert!(engine.state().last_charging_state);
        assert_eq!(engine.on_poll(full(), 60.0), None);
    }

    #[test]
    fn test_re_enable_resumes_after_cooldown() {
        let mut engine = NotificationDecisionEngine::new();
        engine.toggle();
        assert_eq!(engine.on_poll(low(), 0.0), None);

        engine.toggle();
        assert_eq!(engine.on_poll(low(), 1.0), Some(NotificationEvent::LowBattery));
    }
}

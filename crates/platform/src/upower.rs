use std::sync::OnceLock;

use color_eyre::eyre::{eyre, Result, WrapErr};
use regex::Regex;

use crate::battery::{BatteryReading, PowerStateReader};
use crate::command::{CommandRunner, SystemCommandRunner};
use crate::types::ChargeState;

const UPOWER_PROGRAM: &str = "upower";

/// Substring identifying battery devices in `upower -e` output.
pub const BATTERY_DEVICE_MARKER: &str = "battery_";

/// Fields pulled out of `upower -i <device>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpowerDetails {
    pub percentage: u8,
    pub state: ChargeState,
}

impl From<UpowerDetails> for BatteryReading {
    fn from(details: UpowerDetails) -> Self {
        BatteryReading::new(details.percentage, details.state.is_charging())
    }
}

/// Reads battery state by shelling out to `upower`.
pub struct UpowerReader<R = SystemCommandRunner> {
    runner: R,
    program: String,
}

impl UpowerReader<SystemCommandRunner> {
    pub fn system(runner: SystemCommandRunner) -> Self {
        Self::with_runner(runner)
    }
}

impl<R: CommandRunner> UpowerReader<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            program: UPOWER_PROGRAM.to_string(),
        }
    }

    /// Use a different `upower` binary (absolute path or name on `$PATH`).
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Finds the first battery device path, if any.
    pub fn device(&self) -> Result<Option<String>> {
        let listing = self
            .runner
            .run(&self.program, &["-e"])
            .wrap_err("Failed to enumerate power devices")?;
        Ok(find_battery_device(&listing).map(str::to_string))
    }

    /// Queries and parses the detail output for `device`.
    pub fn details(&self, device: &str) -> Result<Option<UpowerDetails>> {
        let output = self
            .runner
            .run(&self.program, &["-i", device])
            .wrap_err_with(|| format!("Failed to query {device}"))?;

        if output.trim().is_empty() {
            tracing::warn!(device, "No output from upower detail query");
            return Ok(None);
        }

        parse_details(&output).map(Some)
    }

    fn try_read(&self) -> Result<BatteryReading> {
        let Some(device) = self.device()? else {
            tracing::debug!("No battery device found");
            return Ok(BatteryReading::FALLBACK);
        };

        match self.details(&device)? {
            Some(details) => {
                tracing::trace!(device, ?details, "Parsed battery details");
                Ok(details.into())
            }
            None => Ok(BatteryReading::FALLBACK),
        }
    }
}

impl<R: CommandRunner> PowerStateReader for UpowerReader<R> {
    fn read(&self) -> BatteryReading {
        match self.try_read() {
            Ok(reading) => reading,
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(%error, "Error getting battery info");
                BatteryReading::FALLBACK
            }
        }
    }
}

/// Returns the first line of `upower -e` output naming a battery.
pub fn find_battery_device(listing: &str) -> Option<&str> {
    listing
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && line.contains(BATTERY_DEVICE_MARKER))
}

fn percentage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"percentage:\s+(\d+)%").expect("valid regex"))
}

fn state_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"state:\s+(\w+)").expect("valid regex"))
}

/// Extracts percentage and state from `upower -i` output.
///
/// Percentages above 100 are clamped.
pub fn parse_details(output: &str) -> Result<UpowerDetails> {
    let percentage = percentage_pattern()
        .captures(output)
        .and_then(|c| c.get(1))
        .ok_or_else(|| eyre!("No percentage in upower output"))?;
    let state = state_pattern()
        .captures(output)
        .and_then(|c| c.get(1))
        .ok_or_else(|| eyre!("No state in upower output"))?;

    let percentage: u32 = percentage
        .as_str()
        .parse()
        .wrap_err_with(|| format!("Invalid percentage {:?}", percentage.as_str()))?;

    Ok(UpowerDetails {
        percentage: percentage.min(100) as u8,
        state: ChargeState::from_token(state.as_str()),
    })
}

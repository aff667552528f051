//! Battery state sampling for batteryind.
//!
//! This crate turns the output of the `upower` command-line tool into a typed
//! [`BatteryReading`]. Sampling never fails outward: a missing tool, a machine
//! without a battery, or output that can't be parsed all produce
//! [`BatteryReading::FALLBACK`] plus a diagnostic log line.
//!
//! # Example
//!
//! ```no_run
//! use batteryind_platform::{PowerStateReader, SystemCommandRunner, UpowerReader};
//!
//! let reader = UpowerReader::system(SystemCommandRunner::default());
//! let reading = reader.read();
//! println!("Charge: {}%", reading.level_percent);
//! ```

mod battery;
mod command;
mod types;
mod upower;

pub use battery::{BatteryReading, PowerStateReader};
pub use command::{CommandError, CommandRunner, SystemCommandRunner, DEFAULT_COMMAND_TIMEOUT};
pub use types::ChargeState;
pub use upower::{
    find_battery_device, parse_details, UpowerDetails, UpowerReader, BATTERY_DEVICE_MARKER,
};

use batteryind_platform::{BatteryReading, PowerStateReader, SystemCommandRunner, UpowerReader};
use color_eyre::eyre::Result;

use crate::config::{config_path, runtime_dir, UserConfig};
use crate::daemon::socket_path;
use crate::engine::{decide, FULL_BATTERY_PERCENT, LOW_BATTERY_PERCENT};

pub fn run(config: &UserConfig) -> Result<()> {
    let reader = UpowerReader::system(SystemCommandRunner::new(config.query_timeout()))
        .program(config.upower_path.clone());

    println!("batteryind check");
    println!("{}", "=".repeat(40));

    println!("\n--- Power Device ---");
    match reader.device() {
        Ok(Some(device)) => {
            println!("Device: {device}");
            match reader.details(&device) {
                Ok(Some(details)) => {
                    println!("Percentage: {}%", details.percentage);
                    println!("State: {}", details.state);
                }
                Ok(None) => println!("Details: no output"),
                Err(e) => println!("Details: {e:#}"),
            }
        }
        Ok(None) => println!("Device: none found"),
        Err(e) => println!("Device: {e:#}"),
    }

    println!("\n--- Reading ---");
    let reading = reader.read();
    println!("Reading: {reading}");
    if reading.is_fallback() {
        println!("(fallback value, the battery could not be read)");
    }

    println!("\n--- Decision ---");
    println!(
        "Rules: low below {LOW_BATTERY_PERCENT}% on battery, full from {FULL_BATTERY_PERCENT}% while charging"
    );
    println!("{}", describe_decision(reading));

    println!("\n--- Paths ---");
    println!("Config: {}", config_path().display());
    println!("Runtime: {}", runtime_dir().display());
    println!("Socket: {}", socket_path().display());

    Ok(())
}

/// What a freshly started monitor would do with `reading`.
pub fn describe_decision(reading: BatteryReading) -> String {
    match decide(reading) {
        Some(event) => format!("Would notify: {}: {}", event.title(), event.body()),
        None => "Would stay quiet".to_string(),
    }
}

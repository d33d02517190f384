//! General system configuration

use cmdtime::ClockStyle;
use embassy_nrf::{
    config::{Config, Debug, HfclkSource, LfclkSource},
    interrupt::Priority,
};

/// Offset of local time to UTC in seconds
pub const TIMEZONE: i32 = 1 * 3_600;

/// Hour style on boot, a long press on the screen toggles it
pub const CLOCK_STYLE: ClockStyle = ClockStyle::TwentyFourHour;

/// Type out the commands on every minute instead of showing them at once
pub const TYPING_ANIMATION: bool = true;

/// Backlight level on boot (0-7)
pub const BRIGHTNESS: u8 = 2;

/// Name used for advertising and the GAP device name
pub const DEVICE_NAME: &[u8] = b"cmdtime";

pub struct SystemConfig {}

impl SystemConfig {
    /// Create new system configuration
    pub fn new() -> Config {
        // Generate default config, required because Config is set as
        // `non_exhaustive`
        let mut config = Config::default();

        // Set high-frequency and low-frequency clock sources to external
        config.hfclk_source = HfclkSource::ExternalXtal;
        config.lfclk_source = LfclkSource::ExternalXtal;

        // Enable DC/DC regulator to massively reduce runtime current consumption
        config.dcdc.reg1 = true;

        // Configure interrupt priorities to exclude 0 (default), 1, and 4,
        // which are reserved for the nrf SoftDevice
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;

        // Allow debugging
        config.debug = Debug::Allowed;

        config
    }
}

//! ESP32 hardware abstraction layer for the drawbridge.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa dual core, 4MB Flash)
//! - **Actuator**: DC gear motor behind a two-input H-bridge
//! - **Signals**: 3-lamp heads, one or more per side
//! - **Boat detection**: HC-SR04 ultrasonic sensors
//! - **Telemetry**: single-channel shaft encoder
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for the default wiring.

mod clock;
mod lights;
mod motor;
mod pulse;
mod range;

pub use clock::Esp32Clock;
pub use lights::{BankPins, Esp32LightBanks, LightSetupError};
pub use motor::Esp32Motor;
pub use pulse::{Esp32PulseCounter, SHAFT_PULSES};
pub use range::{Esp32RangeSensors, RangePins};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32AccessPoint;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::Esp32HttpServer;

/// Default pin assignments.
pub mod pins {
    // =========================================================================
    // Actuator (H-bridge)
    // =========================================================================

    /// PWM that raises the deck
    pub const OPEN_PWM: i32 = 25;

    /// PWM that lowers the deck
    pub const CLOSE_PWM: i32 = 26;

    // =========================================================================
    // Signal banks
    // =========================================================================

    /// Boat-side red lamp
    pub const BOAT_RED: i32 = 4;

    /// Boat-side yellow lamp
    pub const BOAT_YELLOW: i32 = 16;

    /// Boat-side green lamp
    pub const BOAT_GREEN: i32 = 17;

    /// Road-side red lamp
    pub const ROAD_RED: i32 = 18;

    /// Road-side yellow lamp
    pub const ROAD_YELLOW: i32 = 19;

    /// Road-side green lamp
    pub const ROAD_GREEN: i32 = 21;

    // =========================================================================
    // Range sensors (HC-SR04)
    // =========================================================================

    /// Sensor 0 trigger
    pub const SONAR0_TRIG: i32 = 22;

    /// Sensor 0 echo (through a 5V to 3.3V divider)
    pub const SONAR0_ECHO: i32 = 23;

    // =========================================================================
    // Telemetry
    // =========================================================================

    /// Shaft encoder channel A (input only)
    pub const ENCODER_A: i32 = 34;
}

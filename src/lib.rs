//! # rs-drawbridge
//!
//! A drawbridge controller: one deck actuator, a signal bank for boats and
//! one for road traffic, ultrasonic boat detection, and shaft-rotation
//! telemetry, with web and UDP command interfaces.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the actuator, light banks, range sensors and pulse counter
//! - **Safe lights**: Banks always show the pair required by the bridge state; both sides are never Green
//! - **Non-blocking actuation**: Motion is a timed sub-state, so Stop preempts immediately
//! - **Automatic cycles**: A boat in range opens the bridge, which closes again after a dwell
//! - **Command priority**: Stop always wins; explicit accept/reject outcome for every command
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `state` - Bridge, system and sensor states plus the light table
//! - `commands` - Command types with priority system
//! - `controller` - The bridge state machine
//! - `scheduler` - One control-loop iteration: command, timers, sensors, telemetry
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeCommand, BridgeState, CommandSource};
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//!
//! let mut bridge = BridgeController::new(MockMotor::new(), MockLights::new());
//! bridge.initialize().unwrap();
//!
//! bridge.apply_command(BridgeCommand::Toggle, CommandSource::Udp, 0).unwrap();
//! assert_eq!(bridge.bridge_state(), BridgeState::Opening);
//!
//! // Advance time in your main loop
//! bridge.update(5_000).unwrap();
//! assert_eq!(bridge.bridge_state(), BridgeState::Open);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Command types and priority system for bridge control.
pub mod commands;
/// The bridge state machine that drives motor and lights.
pub mod controller;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Bounded priority queue for pending commands.
pub mod priority;
/// Control-loop iteration tying controller, sensors and telemetry together.
pub mod scheduler;
/// Boat detection over the configured range sensors.
pub mod sensing;
/// Timed motion and dwell sub-states.
pub mod sequence;
/// Bridge, system and sensor states.
pub mod state;
/// Rotation-rate telemetry from the shaft pulse counter.
pub mod telemetry;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Text command grammar for the UDP port.
pub mod parsing;

/// Request types for the JSON API (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Network services for the HTTP API and UDP port (requires `std`).
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use commands::{
    BridgeCommand, CommandOutcome, CommandSource, CommandType, PrioritizedCommand, RejectReason,
};
pub use controller::{BridgeController, BridgeError, BridgeSnapshot, ControllerError};
pub use priority::CommandQueue;
pub use scheduler::{ControlLoop, SensorPass, TickReport};
pub use sequence::{Dwell, Motion, MotionProgress};
pub use state::{BoatSensorState, BridgeState, LightAspect, SystemStatus, TrafficSensorState};
pub use traits::{
    BankSide, Clock, Distance, LightBankDriver, LightColor, MotorDirection, MotorDriver,
    PulseCounter, RangeSensor, SensorId, TelemetryReporter,
};

// Config re-exports
pub use config::{
    BridgeConfig, Config, ConfigError, DeviceConfig, LightConfig, SensorConfig, TelemetryConfig,
    UdpConfig, WebConfig, WifiConfig,
};

// Message re-exports (for the JSON API)
#[cfg(feature = "serde")]
pub use messages::CommandRequest;

#[cfg(feature = "serde-json-core")]
pub use messages::parse_command_request;

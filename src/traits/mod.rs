//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow rs-drawbridge to
//! run on different hardware (ESP32, desktop mock) with the same controller.
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`MotorDriver`]: Bidirectional actuator with PWM duty
//! - [`LightBankDriver`]: Boat-side and road-side signal banks
//! - [`RangeSensor`]: Polled ultrasonic boat detection
//! - [`PulseCounter`]: Interrupt-fed shaft pulse counter
//! - [`TelemetryReporter`]: Rotation-rate sink
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;

pub use hardware::*;

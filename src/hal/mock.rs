//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without a physical bridge.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockMotor`] | [`MotorDriver`] | Tracks direction/duty calls |
//! | [`MockLights`] | [`LightBankDriver`] | Tracks the color of each side |
//! | [`MockRangeSensor`] | [`RangeSensor`] | Scripted distances per sensor |
//! | [`MockPulseCounter`] | [`PulseCounter`] | Manually fed pulse count |
//! | [`MockReporter`] | [`TelemetryReporter`] | Captures reported rates |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! Motor and lights can be told to fail (`fail = true`) to exercise the
//! controller's fail-safe path.
//!
//! # Example
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeState};
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//! use rs_drawbridge::traits::{BankSide, LightColor, MotorDirection};
//!
//! let mut bridge = BridgeController::new(MockMotor::new(), MockLights::new());
//! bridge.initialize().unwrap();
//! bridge.open(0).unwrap();
//!
//! assert_eq!(bridge.motor().direction, MotorDirection::Open);
//! assert_eq!(bridge.lights().color(BankSide::Boat), Some(LightColor::Yellow));
//! assert_eq!(bridge.bridge_state(), BridgeState::Opening);
//! ```
//!
//! [`MotorDriver`]: crate::traits::MotorDriver
//! [`LightBankDriver`]: crate::traits::LightBankDriver
//! [`RangeSensor`]: crate::traits::RangeSensor
//! [`PulseCounter`]: crate::traits::PulseCounter
//! [`TelemetryReporter`]: crate::traits::TelemetryReporter
//! [`Clock`]: crate::traits::Clock

extern crate alloc;
use alloc::vec::Vec;

use crate::state::LightAspect;
use crate::traits::{
    BankSide, Clock, Distance, LightBankDriver, LightColor, MotorDirection, MotorDriver,
    PulseCounter, RangeSensor, SensorId, TelemetryReporter,
};

// ============================================================================
// Actuator Mocks
// ============================================================================

/// Mock motor driver for testing.
///
/// Records every drive call for verification. Use the public fields to
/// inspect state after test operations.
///
/// # Example
///
/// ```rust
/// use rs_drawbridge::hal::MockMotor;
/// use rs_drawbridge::traits::{MotorDriver, MotorDirection};
///
/// let mut motor = MockMotor::new();
/// motor.drive(MotorDirection::Close, 0.8).unwrap();
///
/// assert_eq!(motor.direction, MotorDirection::Close);
/// assert_eq!(motor.duty, 0.8);
/// assert_eq!(motor.call_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMotor {
    /// Last commanded direction.
    pub direction: MotorDirection,
    /// Last commanded duty (0.0 to 1.0).
    pub duty: f32,
    /// Number of times `drive` was called.
    pub call_count: usize,
    /// Every `(direction, duty)` pair in call order.
    pub history: Vec<(MotorDirection, f32)>,
    /// When true, every call fails without changing state.
    pub fail: bool,
}

impl MockMotor {
    /// Creates a new mock motor at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock motor whose calls all fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// True when the last command left the motor energized.
    pub fn is_running(&self) -> bool {
        self.direction != MotorDirection::Neutral && self.duty > 0.0
    }
}

impl MotorDriver for MockMotor {
    type Error = ();

    fn drive(&mut self, direction: MotorDirection, duty: f32) -> Result<(), ()> {
        self.call_count += 1;
        if self.fail {
            return Err(());
        }
        let duty = duty.clamp(0.0, 1.0);
        self.direction = direction;
        self.duty = duty;
        self.history.push((direction, duty));
        Ok(())
    }
}

/// Mock light banks for testing.
///
/// Colors start unset (`None`) so tests can tell "never written" apart from
/// Red.
///
/// ```rust
/// use rs_drawbridge::hal::MockLights;
/// use rs_drawbridge::traits::{BankSide, LightBankDriver, LightColor};
///
/// let mut lights = MockLights::new();
/// assert_eq!(lights.color(BankSide::Road), None);
///
/// lights.set_bank(BankSide::Road, LightColor::Green).unwrap();
/// assert_eq!(lights.color(BankSide::Road), Some(LightColor::Green));
/// ```
#[derive(Debug, Default)]
pub struct MockLights {
    /// Current boat-side color.
    pub boat: Option<LightColor>,
    /// Current road-side color.
    pub road: Option<LightColor>,
    /// Every write in call order.
    pub history: Vec<(BankSide, LightColor)>,
    /// When true, every call fails without changing state.
    pub fail: bool,
}

impl MockLights {
    /// Creates mock lights with nothing lit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates mock lights whose calls all fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Current color of `side`, if it was ever set.
    pub fn color(&self, side: BankSide) -> Option<LightColor> {
        match side {
            BankSide::Boat => self.boat,
            BankSide::Road => self.road,
        }
    }

    /// Both sides as an aspect, once both were set.
    pub fn aspect(&self) -> Option<LightAspect> {
        Some(LightAspect {
            boat: self.boat?,
            road: self.road?,
        })
    }

    /// True if both sides ever showed Green at the same time.
    pub fn ever_both_green(&self) -> bool {
        let mut boat = None;
        let mut road = None;
        self.history.iter().any(|(side, color)| {
            match side {
                BankSide::Boat => boat = Some(*color),
                BankSide::Road => road = Some(*color),
            }
            boat == Some(LightColor::Green) && road == Some(LightColor::Green)
        })
    }
}

impl LightBankDriver for MockLights {
    type Error = ();

    fn set_bank(&mut self, side: BankSide, color: LightColor) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        match side {
            BankSide::Boat => self.boat = Some(color),
            BankSide::Road => self.road = Some(color),
        }
        self.history.push((side, color));
        Ok(())
    }
}

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock range sensors for testing.
///
/// Each sensor has a standing reading (default: no echo). One-shot readings
/// queued with [`queue_reading`](Self::queue_reading) are returned first.
///
/// ```rust
/// use rs_drawbridge::hal::MockRangeSensor;
/// use rs_drawbridge::traits::{Distance, RangeSensor};
///
/// let mut sensors = MockRangeSensor::new();
/// assert_eq!(sensors.measure(0), None);
///
/// sensors.queue_reading(0, Some(Distance::from_cm(5.0)));
/// sensors.set_distance(0, 40.0);
/// assert_eq!(sensors.measure(0), Some(Distance::from_cm(5.0)));
/// assert_eq!(sensors.measure(0), Some(Distance::from_cm(40.0)));
/// assert_eq!(sensors.polled, vec![0, 0, 0]);
/// ```
#[derive(Debug, Default)]
pub struct MockRangeSensor {
    standing: Vec<(SensorId, Option<Distance>)>,
    queued: Vec<(SensorId, Option<Distance>)>,
    /// Sensor ids in the order they were measured.
    pub polled: Vec<SensorId>,
}

impl MockRangeSensor {
    /// Creates sensors that never see an echo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the standing reading of `sensor` to `cm`.
    pub fn set_distance(&mut self, sensor: SensorId, cm: f32) {
        self.set_reading(sensor, Some(Distance::from_cm(cm)));
    }

    /// Make `sensor` time out on every poll.
    pub fn set_no_echo(&mut self, sensor: SensorId) {
        self.set_reading(sensor, None);
    }

    fn set_reading(&mut self, sensor: SensorId, reading: Option<Distance>) {
        match self.standing.iter_mut().find(|(id, _)| *id == sensor) {
            Some(entry) => entry.1 = reading,
            None => self.standing.push((sensor, reading)),
        }
    }

    /// Return `reading` from the next poll of `sensor` only.
    pub fn queue_reading(&mut self, sensor: SensorId, reading: Option<Distance>) {
        self.queued.push((sensor, reading));
    }
}

impl RangeSensor for MockRangeSensor {
    fn measure(&mut self, sensor: SensorId) -> Option<Distance> {
        self.polled.push(sensor);
        if let Some(pos) = self.queued.iter().position(|(id, _)| *id == sensor) {
            return self.queued.remove(pos).1;
        }
        self.standing
            .iter()
            .find(|(id, _)| *id == sensor)
            .and_then(|(_, reading)| *reading)
    }
}

/// Mock pulse counter for testing.
///
/// ```rust
/// use rs_drawbridge::hal::MockPulseCounter;
/// use rs_drawbridge::traits::PulseCounter;
///
/// let mut counter = MockPulseCounter::new();
/// counter.add_pulses(350);
/// assert_eq!(counter.take_and_reset(), 350);
/// assert_eq!(counter.take_and_reset(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockPulseCounter {
    /// Pulses accumulated since the last read.
    pub pending: u32,
    /// Number of reads.
    pub reads: usize,
}

impl MockPulseCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `n` edges.
    pub fn add_pulses(&mut self, n: u32) {
        self.pending = self.pending.saturating_add(n);
    }
}

impl PulseCounter for MockPulseCounter {
    fn take_and_reset(&mut self) -> u32 {
        self.reads += 1;
        core::mem::take(&mut self.pending)
    }
}

/// Mock telemetry sink capturing every reported rate.
#[derive(Debug, Default)]
pub struct MockReporter {
    /// Reported rates in revolutions per minute, in order.
    pub rates: Vec<f32>,
}

impl MockReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent report.
    pub fn last(&self) -> Option<f32> {
        self.rates.last().copied()
    }
}

impl TelemetryReporter for MockReporter {
    fn report_rate(&mut self, revolutions_per_minute: f32) {
        self.rates.push(revolutions_per_minute);
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_drawbridge::hal::MockClock;
/// use rs_drawbridge::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Tests
// ============================================================================

//! The cooperative control loop.
//!
//! One [`ControlLoop::tick`] is one scheduling iteration:
//!
//! 1. apply at most one pending external command
//! 2. advance the controller's timers (settle motion, fire the dwell close)
//! 3. one pass over the boat-detection sensors
//! 4. sample rotation telemetry if the window has elapsed
//!
//! Nothing blocks; the caller decides the tick period (20 ms by default).
//!
//! Step 3 reads hardware and needs no controller, so a caller sharing the
//! controller behind a lock can run [`ControlLoop::sense`] first and hand
//! the result to [`ControlLoop::apply`] while holding the lock.
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeState, Config};
//! use rs_drawbridge::hal::{MockLights, MockMotor, MockPulseCounter, MockRangeSensor, MockReporter};
//! use rs_drawbridge::scheduler::ControlLoop;
//!
//! let config = Config::default();
//! let mut bridge = BridgeController::with_config(MockMotor::new(), MockLights::new(), &config.bridge);
//! bridge.initialize().unwrap();
//!
//! let mut sensors = MockRangeSensor::new();
//! sensors.set_distance(0, 5.0);
//! let mut control = ControlLoop::new(sensors, MockPulseCounter::new(), MockReporter::new(), &config);
//!
//! let report = control.tick(&mut bridge, None, 0).unwrap();
//! assert!(report.auto_opened);
//! assert_eq!(bridge.bridge_state(), BridgeState::Opening);
//! ```

use crate::commands::{CommandOutcome, PrioritizedCommand};
use crate::config::Config;
use crate::controller::{BridgeController, ControllerError};
use crate::sensing::{BoatDetector, Detection};
use crate::state::BridgeState;
use crate::telemetry::RotationTelemetry;
use crate::traits::{LightBankDriver, MotorDriver, PulseCounter, RangeSensor, TelemetryReporter};

/// What happened during one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// Outcome of the serviced command, if one was pending.
    pub command: Option<CommandOutcome>,
    /// In-range reading from this sensor pass.
    pub detection: Option<Detection>,
    /// True if the detection started an automatic cycle.
    pub auto_opened: bool,
    /// Rate reported this iteration, if the window elapsed.
    pub rotation_rpm: Option<f32>,
    /// Bridge state at the start of the iteration.
    pub state_before: BridgeState,
    /// Bridge state at the end of the iteration.
    pub state_after: BridgeState,
}

impl TickReport {
    /// True if the bridge state changed during the iteration.
    pub fn transitioned(&self) -> bool {
        self.state_before != self.state_after
    }
}

/// Result of one pass over the boat-detection sensors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorPass {
    /// No sensors are configured; the boat sensor state is left alone.
    Skipped,
    /// The sensors were polled; the first in-range reading, if any.
    Polled(Option<Detection>),
}

/// Sensors and telemetry driven once per iteration.
pub struct ControlLoop<R: RangeSensor, P: PulseCounter, T: TelemetryReporter> {
    sensors: R,
    detector: BoatDetector,
    telemetry: RotationTelemetry<P, T>,
}

impl<R: RangeSensor, P: PulseCounter, T: TelemetryReporter> ControlLoop<R, P, T> {
    /// Build from the sensor and telemetry sections of `config`.
    pub fn new(sensors: R, counter: P, reporter: T, config: &Config) -> Self {
        Self {
            sensors,
            detector: BoatDetector::from_config(&config.sensors),
            telemetry: RotationTelemetry::new(counter, reporter, &config.telemetry),
        }
    }

    /// Run one scheduling iteration at `now_ms`.
    pub fn tick<M: MotorDriver, L: LightBankDriver>(
        &mut self,
        bridge: &mut BridgeController<M, L>,
        pending: Option<PrioritizedCommand>,
        now_ms: u64,
    ) -> Result<TickReport, ControllerError<M, L>> {
        let pass = self.sense();
        self.apply(bridge, pending, pass, now_ms)
    }

    /// Poll the range sensors in configured order.
    pub fn sense(&mut self) -> SensorPass {
        if self.detector.has_sensors() {
            SensorPass::Polled(self.detector.poll(&mut self.sensors))
        } else {
            SensorPass::Skipped
        }
    }

    /// Apply the command, timer and detection steps of an iteration using
    /// a sensor pass taken earlier, then sample telemetry.
    pub fn apply<M: MotorDriver, L: LightBankDriver>(
        &mut self,
        bridge: &mut BridgeController<M, L>,
        pending: Option<PrioritizedCommand>,
        pass: SensorPass,
        now_ms: u64,
    ) -> Result<TickReport, ControllerError<M, L>> {
        let state_before = bridge.bridge_state();

        let command = match pending {
            Some(cmd) => Some(bridge.apply_command(cmd.command, cmd.source, now_ms)?),
            None => None,
        };

        bridge.update(now_ms)?;

        let mut detection = None;
        let mut auto_opened = false;
        if let SensorPass::Polled(hit) = pass {
            detection = hit;
            auto_opened = bridge.apply_detection(detection.is_some(), now_ms)?;
        }

        let rotation_rpm = self.telemetry.sample(now_ms);

        Ok(TickReport {
            command,
            detection,
            auto_opened,
            rotation_rpm,
            state_before,
            state_after: bridge.bridge_state(),
        })
    }

    /// The boat detector.
    pub fn detector(&self) -> &BoatDetector {
        &self.detector
    }

    /// The range sensors, mutably.
    pub fn sensors_mut(&mut self) -> &mut R {
        &mut self.sensors
    }

    /// The telemetry sampler.
    pub fn telemetry(&self) -> &RotationTelemetry<P, T> {
        &self.telemetry
    }

    /// The telemetry sampler, mutably.
    pub fn telemetry_mut(&mut self) -> &mut RotationTelemetry<P, T> {
        &mut self.telemetry
    }
}

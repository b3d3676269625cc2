//! The bridge controller state machine.
//!
//! [`BridgeController`] owns the bridge position, the re-entrancy guard and
//! the advisory sensor states. It is the only thing that drives the motor and
//! the signal banks.
//!
//! # Overview
//!
//! The controller:
//! - Accepts discrete commands (open, close, toggle, stop, re-arm, overrides)
//!   and answers each with an explicit [`CommandOutcome`]
//! - Runs timed actuation sequences without blocking ([`update`](BridgeController::update))
//! - Opens automatically when a boat is detected, holds open for a dwell,
//!   then closes again
//! - Derives both light banks from [`BridgeState`] on every transition
//!
//! Valid `(BridgeState, SystemStatus)` pairs are (Closed, Ready),
//! (Opening, Moving), (Open, Ready), (Closing, Moving) and
//! (Stopped, Stopped).
//!
//! # Example
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeState, SystemStatus};
//! use rs_drawbridge::config::BridgeConfig;
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//!
//! let config = BridgeConfig::default().with_actuation_ms(1000);
//! let mut bridge = BridgeController::with_config(MockMotor::new(), MockLights::new(), &config);
//! bridge.initialize().unwrap();
//!
//! bridge.toggle(0).unwrap();
//! assert_eq!(bridge.bridge_state(), BridgeState::Opening);
//! assert_eq!(bridge.system_status(), SystemStatus::Moving);
//!
//! // Main loop - call update() every tick
//! bridge.update(1000).unwrap();
//! assert_eq!(bridge.bridge_state(), BridgeState::Open);
//! assert_eq!(bridge.system_status(), SystemStatus::Ready);
//! ```
//!
//! # Stop and re-arm
//!
//! Stop preempts any sequence, zeroes the motor and forces both banks Red.
//! The controller then holds in (Stopped, Stopped) until a re-arm, which
//! lowers the deck with a full close sequence.
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeState};
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//!
//! let mut bridge = BridgeController::new(MockMotor::new(), MockLights::new());
//! bridge.initialize().unwrap();
//! bridge.open(0).unwrap();
//! bridge.stop(100).unwrap();
//! assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
//! assert_eq!(bridge.motor().duty, 0.0);
//!
//! assert!(!bridge.open(200).unwrap().is_accepted());
//! assert!(bridge.rearm(300).unwrap().is_accepted());
//! assert_eq!(bridge.bridge_state(), BridgeState::Closing);
//! ```

use core::fmt;

use crate::commands::{BridgeCommand, CommandOutcome, CommandSource, RejectReason};
use crate::config::BridgeConfig;
use crate::sequence::{Dwell, Motion, MotionProgress};
use crate::state::{BoatSensorState, BridgeState, LightAspect, SystemStatus, TrafficSensorState};
use crate::traits::{LightBankDriver, MotorDirection, MotorDriver};

/// Hardware failure while driving the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError<ME, LE> {
    /// The motor driver failed.
    Motor(ME),
    /// A light bank driver failed.
    Lights(LE),
}

impl<ME: fmt::Debug, LE: fmt::Debug> fmt::Display for BridgeError<ME, LE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Motor(e) => write!(f, "motor driver failure: {:?}", e),
            BridgeError::Lights(e) => write!(f, "light bank failure: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<ME: fmt::Debug, LE: fmt::Debug> std::error::Error for BridgeError<ME, LE> {}

/// Error type of a controller over motor `M` and lights `L`.
pub type ControllerError<M, L> =
    BridgeError<<M as MotorDriver>::Error, <L as LightBankDriver>::Error>;

/// Main bridge controller.
///
/// # Type Parameters
///
/// - `M`: The motor driver ([`MotorDriver`] trait)
/// - `L`: The signal banks ([`LightBankDriver`] trait)
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. For multi-threaded scenarios
/// (e.g., web server + control loop), wrap in `Arc<Mutex<BridgeController>>`
/// or use the `SharedBridgeState` wrapper from the services module
/// (requires `web` or `udp` feature).
pub struct BridgeController<M: MotorDriver, L: LightBankDriver> {
    motor: M,
    lights: L,
    bridge: BridgeState,
    status: SystemStatus,
    boat: BoatSensorState,
    traffic: TrafficSensorState,
    motion: Option<Motion>,
    dwell: Option<Dwell>,
    // Current motion was started by the detection policy.
    automatic: bool,
    actuation_ms: u64,
    dwell_ms: u64,
    full_duty: f32,
}

impl<M: MotorDriver, L: LightBankDriver> BridgeController<M, L> {
    /// Create a controller with default timing.
    pub fn new(motor: M, lights: L) -> Self {
        Self::with_config(motor, lights, &BridgeConfig::default())
    }

    /// Create a controller with the given timing.
    pub fn with_config(motor: M, lights: L, config: &BridgeConfig) -> Self {
        Self {
            motor,
            lights,
            bridge: BridgeState::Closed,
            status: SystemStatus::Ready,
            boat: BoatSensorState::Clear,
            traffic: TrafficSensorState::Clear,
            motion: None,
            dwell: None,
            automatic: false,
            actuation_ms: u64::from(config.actuation_ms),
            dwell_ms: u64::from(config.dwell_ms),
            full_duty: config.full_duty.clamp(0.0, 1.0),
        }
    }

    /// Bring the outputs in line with the power-on state: motor at rest,
    /// lights in the Closed configuration.
    ///
    /// The deck is assumed closed; there is no position sensor to check.
    pub fn initialize(&mut self) -> Result<(), ControllerError<M, L>> {
        self.motor.stop().map_err(BridgeError::Motor)?;
        self.write_lights(LightAspect::for_state(self.bridge))
            .map_err(BridgeError::Lights)?;
        log::info!(
            "bridge controller ready: {} / {}",
            self.bridge.as_str(),
            self.status.as_str()
        );
        Ok(())
    }

    /// Apply a command.
    ///
    /// Rejections are reported in the [`CommandOutcome`]; `Err` is reserved
    /// for hardware failures, after which the controller is left in the
    /// Stopped posture.
    pub fn apply_command(
        &mut self,
        cmd: BridgeCommand,
        source: CommandSource,
        now_ms: u64,
    ) -> Result<CommandOutcome, ControllerError<M, L>> {
        let outcome = match cmd {
            BridgeCommand::Open => self.request_motion(MotorDirection::Open, now_ms)?,
            BridgeCommand::Close => self.request_motion(MotorDirection::Close, now_ms)?,
            BridgeCommand::Toggle => match self.guard() {
                Some(reason) => CommandOutcome::rejected(reason),
                None => match self.bridge {
                    BridgeState::Closed => self.request_motion(MotorDirection::Open, now_ms)?,
                    BridgeState::Open => self.request_motion(MotorDirection::Close, now_ms)?,
                    state => CommandOutcome::rejected(RejectReason::InvalidState { state }),
                },
            },
            BridgeCommand::Stop => self.emergency_stop()?,
            BridgeCommand::Rearm => self.rearm_from_stop(now_ms)?,
            BridgeCommand::OverrideBoatDetected => {
                self.boat = BoatSensorState::Detected;
                CommandOutcome::Accepted
            }
            BridgeCommand::OverrideBoatClear => {
                self.boat = BoatSensorState::Clear;
                CommandOutcome::Accepted
            }
            BridgeCommand::OverrideTrafficClear => {
                self.traffic = TrafficSensorState::Clear;
                CommandOutcome::Accepted
            }
            BridgeCommand::OverrideTrafficOccupied => {
                self.traffic = TrafficSensorState::Occupied;
                CommandOutcome::Accepted
            }
        };

        match outcome {
            CommandOutcome::Accepted => {
                log::info!("{} accepted from {}", cmd.as_str(), source.as_str())
            }
            CommandOutcome::Rejected { reason } => log::warn!(
                "{} from {} rejected: {}",
                cmd.as_str(),
                source.as_str(),
                reason
            ),
        }

        Ok(outcome)
    }

    /// Advance timers - call every tick (e.g., 20ms).
    ///
    /// Settles a motion whose actuation time has elapsed and fires the
    /// automatic close once a dwell expires.
    pub fn update(&mut self, now_ms: u64) -> Result<(), ControllerError<M, L>> {
        if let Some(motion) = self.motion {
            if motion.is_complete(now_ms) {
                self.settle(motion)?;
            }
        }

        if let Some(dwell) = self.dwell {
            if dwell.is_expired(now_ms) {
                self.dwell = None;
                if self.bridge == BridgeState::Open && self.status == SystemStatus::Ready {
                    log::info!("dwell elapsed, closing");
                    self.start_motion(MotorDirection::Close, now_ms)?;
                    log::info!(
                        "{} accepted from {}",
                        BridgeCommand::Close.as_str(),
                        CommandSource::Automatic.as_str()
                    );
                }
            }
        }

        Ok(())
    }

    /// Record the result of one sensor pass.
    ///
    /// Overwrites [`BoatSensorState`]. On a hit while (Closed, Ready) an
    /// automatic cycle starts: open, dwell, close. Returns true if it did.
    pub fn apply_detection(
        &mut self,
        detected: bool,
        now_ms: u64,
    ) -> Result<bool, ControllerError<M, L>> {
        self.boat = if detected {
            BoatSensorState::Detected
        } else {
            BoatSensorState::Clear
        };

        if !detected || self.bridge != BridgeState::Closed || self.status != SystemStatus::Ready
        {
            return Ok(false);
        }

        log::info!("boat detected, opening automatically");
        self.start_motion(MotorDirection::Open, now_ms)?;
        self.automatic = true;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Convenience operations (source: Local)
    // ------------------------------------------------------------------

    /// Request the bridge to open.
    pub fn open(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        self.apply_command(BridgeCommand::Open, CommandSource::Local, now_ms)
    }

    /// Request the bridge to close.
    pub fn close(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        self.apply_command(BridgeCommand::Close, CommandSource::Local, now_ms)
    }

    /// Open if Closed, close if Open.
    pub fn toggle(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        self.apply_command(BridgeCommand::Toggle, CommandSource::Local, now_ms)
    }

    /// Safety stop. Always accepted.
    pub fn stop(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        self.apply_command(BridgeCommand::Stop, CommandSource::Local, now_ms)
    }

    /// Leave Stopped by lowering the deck.
    pub fn rearm(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        self.apply_command(BridgeCommand::Rearm, CommandSource::Local, now_ms)
    }

    /// Mark a boat as present without moving anything.
    pub fn override_boat_detected(&mut self) {
        self.boat = BoatSensorState::Detected;
    }

    /// Mark the waterway clear without moving anything.
    pub fn override_boat_clear(&mut self) {
        self.boat = BoatSensorState::Clear;
    }

    /// Mark the deck free of road traffic.
    pub fn override_traffic_clear(&mut self) {
        self.traffic = TrafficSensorState::Clear;
    }

    /// Mark road traffic on the deck.
    pub fn override_traffic_occupied(&mut self) {
        self.traffic = TrafficSensorState::Occupied;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current bridge position. No side effects.
    pub fn query_state(&self) -> BridgeState {
        self.bridge
    }

    /// Get the full state for UI/API.
    pub fn state(&self, now_ms: u64) -> BridgeSnapshot {
        BridgeSnapshot {
            bridge: self.bridge,
            status: self.status,
            boat_sensor: self.boat,
            traffic_sensor: self.traffic,
            lights: LightAspect::for_state(self.bridge),
            motion: self.motion.map(|m| m.progress(now_ms)),
            dwell_remaining_ms: self.dwell.map(|d| d.remaining_ms(now_ms)),
        }
    }

    /// Current bridge position.
    pub fn bridge_state(&self) -> BridgeState {
        self.bridge
    }

    /// Current re-entrancy guard.
    pub fn system_status(&self) -> SystemStatus {
        self.status
    }

    /// Most recent boat-detection result.
    pub fn boat_sensor(&self) -> BoatSensorState {
        self.boat
    }

    /// Operator-reported road traffic.
    pub fn traffic_sensor(&self) -> TrafficSensorState {
        self.traffic
    }

    /// True while an actuation sequence is in flight.
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// The in-flight motion, if any.
    pub fn motion(&self) -> Option<&Motion> {
        self.motion.as_ref()
    }

    /// The pending automatic-close timer, if any.
    pub fn dwell(&self) -> Option<&Dwell> {
        self.dwell.as_ref()
    }

    /// The motor driver.
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// The motor driver, mutably. Changes made here bypass the state machine.
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }

    /// The light bank driver.
    pub fn lights(&self) -> &L {
        &self.lights
    }

    /// The light bank driver, mutably. Changes made here bypass the state machine.
    pub fn lights_mut(&mut self) -> &mut L {
        &mut self.lights
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Why a new sequence may not start right now.
    fn guard(&self) -> Option<RejectReason> {
        match self.status {
            SystemStatus::Stopped => Some(RejectReason::Stopped),
            SystemStatus::Moving => Some(RejectReason::Busy),
            SystemStatus::Ready => None,
        }
    }

    fn request_motion(
        &mut self,
        direction: MotorDirection,
        now_ms: u64,
    ) -> Result<CommandOutcome, ControllerError<M, L>> {
        if let Some(reason) = self.guard() {
            return Ok(CommandOutcome::rejected(reason));
        }
        let required = match direction {
            MotorDirection::Open => BridgeState::Closed,
            MotorDirection::Close | MotorDirection::Neutral => BridgeState::Open,
        };
        if self.bridge != required {
            return Ok(CommandOutcome::rejected(RejectReason::InvalidState {
                state: self.bridge,
            }));
        }
        self.start_motion(direction, now_ms)?;
        Ok(CommandOutcome::Accepted)
    }

    fn rearm_from_stop(&mut self, now_ms: u64) -> Result<CommandOutcome, ControllerError<M, L>> {
        if self.bridge != BridgeState::Stopped || self.status != SystemStatus::Stopped {
            return Ok(CommandOutcome::rejected(RejectReason::InvalidState {
                state: self.bridge,
            }));
        }
        log::info!("re-arming: lowering deck from unknown position");
        self.start_motion(MotorDirection::Close, now_ms)?;
        Ok(CommandOutcome::Accepted)
    }

    fn start_motion(
        &mut self,
        direction: MotorDirection,
        now_ms: u64,
    ) -> Result<(), ControllerError<M, L>> {
        let motion = Motion::start(direction, now_ms, self.actuation_ms);
        self.dwell = None;
        self.automatic = false;
        self.status = SystemStatus::Moving;
        self.motion = Some(motion);

        if let Err(e) = self.set_bridge_state(motion.moving_state()) {
            log::error!("light bank failure starting {} sequence", direction.as_str());
            self.fail_safe();
            return Err(BridgeError::Lights(e));
        }
        if let Err(e) = self.motor.drive(direction, self.full_duty) {
            log::error!("motor failure starting {} sequence", direction.as_str());
            self.fail_safe();
            return Err(BridgeError::Motor(e));
        }
        Ok(())
    }

    fn settle(&mut self, motion: Motion) -> Result<(), ControllerError<M, L>> {
        if let Err(e) = self.motor.stop() {
            log::error!("motor failure settling {}", motion.settled_state().as_str());
            self.fail_safe();
            return Err(BridgeError::Motor(e));
        }
        self.motion = None;
        if let Err(e) = self.set_bridge_state(motion.settled_state()) {
            log::error!("light bank failure settling {}", motion.settled_state().as_str());
            self.fail_safe();
            return Err(BridgeError::Lights(e));
        }
        self.status = SystemStatus::Ready;

        if self.automatic && motion.settled_state() == BridgeState::Open {
            self.dwell = Some(Dwell::start(motion.deadline_ms, self.dwell_ms));
            log::debug!("holding open for {} ms", self.dwell_ms);
        }
        self.automatic = false;
        Ok(())
    }

    fn emergency_stop(&mut self) -> Result<CommandOutcome, ControllerError<M, L>> {
        log::warn!("STOP from {}", self.bridge.as_str());
        let motor = self.motor.stop();
        self.motion = None;
        self.dwell = None;
        self.automatic = false;
        self.status = SystemStatus::Stopped;
        let lights = self.set_bridge_state(BridgeState::Stopped);

        if let Err(e) = motor {
            log::error!("motor failure during stop");
            return Err(BridgeError::Motor(e));
        }
        if let Err(e) = lights {
            log::error!("light bank failure during stop");
            return Err(BridgeError::Lights(e));
        }
        Ok(CommandOutcome::Accepted)
    }

    /// Best-effort Stopped posture after a hardware failure.
    fn fail_safe(&mut self) {
        log::warn!("entering fail-safe stop");
        let _ = self.motor.stop();
        self.motion = None;
        self.dwell = None;
        self.automatic = false;
        self.status = SystemStatus::Stopped;
        self.bridge = BridgeState::Stopped;
        let _ = self.write_lights(LightAspect::ALL_RED);
    }

    /// The only place `bridge` changes outside the fail-safe path; the
    /// lights follow in the same call.
    fn set_bridge_state(&mut self, next: BridgeState) -> Result<(), L::Error> {
        if next != self.bridge {
            log::info!("bridge {} -> {}", self.bridge.as_str(), next.as_str());
        }
        self.bridge = next;
        self.write_lights(LightAspect::for_state(next))
    }

    fn write_lights(&mut self, aspect: LightAspect) -> Result<(), L::Error> {
        for side in aspect.write_order() {
            self.lights.set_bank(side, aspect.color(side))?;
        }
        Ok(())
    }
}

/// Full state snapshot for UI/API.
///
/// ```rust
/// use rs_drawbridge::{BridgeController, BridgeState, SystemStatus};
/// use rs_drawbridge::hal::{MockLights, MockMotor};
///
/// let bridge = BridgeController::new(MockMotor::new(), MockLights::new());
/// let state = bridge.state(0);
/// assert_eq!(state.bridge, BridgeState::Closed);
/// assert_eq!(state.status, SystemStatus::Ready);
/// assert!(state.motion.is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeSnapshot {
    /// Deck position.
    pub bridge: BridgeState,
    /// Re-entrancy guard.
    pub status: SystemStatus,
    /// Most recent boat detection.
    pub boat_sensor: BoatSensorState,
    /// Operator-reported road traffic.
    pub traffic_sensor: TrafficSensorState,
    /// Colors both banks show.
    pub lights: LightAspect,
    /// Progress of the in-flight motion, if any.
    pub motion: Option<MotionProgress>,
    /// Time until the automatic close, if a dwell is running.
    pub dwell_remaining_ms: Option<u64>,
}

impl Default for BridgeSnapshot {
    fn default() -> Self {
        Self {
            bridge: BridgeState::Closed,
            status: SystemStatus::Ready,
            boat_sensor: BoatSensorState::Clear,
            traffic_sensor: TrafficSensorState::Clear,
            lights: LightAspect::for_state(BridgeState::Closed),
            motion: None,
            dwell_remaining_ms: None,
        }
    }
}

//! Unified shared state for all bridge services.
//!
//! `SharedBridgeState` owns the single [`BridgeController`] and the pending
//! command queue. The HTTP API, the UDP port, and the control loop all reach
//! the controller through it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_drawbridge::services::SharedBridgeState;
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//! use rs_drawbridge::{BridgeCommand, BridgeController, CommandSource};
//!
//! let state = Arc::new(SharedBridgeState::new(BridgeController::new(MockMotor::new(), MockLights::new())));
//!
//! // The UDP listener queues commands...
//! assert!(state.submit(BridgeCommand::Open, CommandSource::Udp));
//!
//! // ...and the control loop takes one per iteration.
//! assert_eq!(state.take_pending().unwrap().command, BridgeCommand::Open);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::controller::{BridgeController, BridgeSnapshot, ControllerError};
use crate::priority::CommandQueue;
use crate::scheduler::{ControlLoop, TickReport};
use crate::traits::{LightBankDriver, MotorDriver, PulseCounter, RangeSensor, TelemetryReporter};
use crate::{BridgeCommand, BridgeState, CommandOutcome, CommandSource, PrioritizedCommand};

/// Capacity of the pending command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 16;

// ============================================================================
// State Provider Trait
// ============================================================================

/// Trait for providing bridge state access.
///
/// This abstraction allows services (HTTP, UDP) to work with different
/// state management strategies on different platforms.
pub trait StateProvider: Send + Sync {
    /// Get the current bridge snapshot.
    fn state(&self) -> BridgeSnapshot;

    /// Get the current timestamp in milliseconds.
    fn now_ms(&self) -> u64;

    /// Apply a command to the controller immediately. Returns the outcome
    /// and the bridge state read under the same lock.
    fn apply_command(
        &self,
        cmd: BridgeCommand,
        source: CommandSource,
    ) -> Result<(CommandOutcome, BridgeState), ()>;

    /// Queue a command for the control loop. Returns false if the queue
    /// is full and the command could not displace anything.
    fn submit(&self, cmd: BridgeCommand, source: CommandSource) -> bool;
}

// ============================================================================
// Shared Bridge State
// ============================================================================

/// Unified shared state for all services (web, UDP, control loop).
///
/// # Thread Safety
///
/// - Uses `Mutex` for controller access because the 20ms control loop
///   writes on every iteration.
/// - The queue has its own lock so network listeners never wait on a
///   controller update.
/// - All timestamp calculations use the same `start_time`.
pub struct SharedBridgeState<M: MotorDriver, L: LightBankDriver> {
    controller: Mutex<BridgeController<M, L>>,
    queue: Mutex<CommandQueue<COMMAND_QUEUE_DEPTH>>,
    start_time: Instant,
}

impl<M: MotorDriver, L: LightBankDriver> SharedBridgeState<M, L> {
    /// Create new shared state wrapping a controller.
    ///
    /// The `start_time` is set to `Instant::now()`, which becomes the time base
    /// for all `now_ms()` calls across all services sharing this state.
    pub fn new(controller: BridgeController<M, L>) -> Self {
        Self {
            controller: Mutex::new(controller),
            queue: Mutex::new(CommandQueue::new()),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since state creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// The start time instant.
    #[inline]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Access the controller with a mutable lock.
    ///
    /// The closure pattern prevents accidentally holding the lock across
    /// await points.
    pub fn with_controller<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BridgeController<M, L>) -> R,
    {
        let mut guard = self.lock_controller();
        f(&mut guard)
    }

    /// Read-only state snapshot.
    pub fn state(&self) -> BridgeSnapshot {
        let now_ms = self.now_ms();
        self.lock_controller().state(now_ms)
    }

    /// Queue `cmd` with the current timestamp.
    pub fn submit(&self, cmd: BridgeCommand, source: CommandSource) -> bool {
        let prioritized = PrioritizedCommand::new(cmd, source, self.now_ms());
        let queued = self.lock_queue().push(prioritized);
        if queued {
            log::debug!("queued {} from {}", cmd.as_str(), source.as_str());
        } else {
            log::warn!("queue full, dropped {} from {}", cmd.as_str(), source.as_str());
        }
        queued
    }

    /// Highest-priority pending command, removed from the queue.
    pub fn take_pending(&self) -> Option<PrioritizedCommand> {
        self.lock_queue().pop()
    }

    /// Number of commands waiting.
    pub fn pending_len(&self) -> usize {
        self.lock_queue().len()
    }

    /// Run one control-loop iteration against the shared controller.
    ///
    /// The sensor pass runs before the controller lock is taken, so a slow
    /// ranging pulse never delays an HTTP stop.
    pub fn tick<R, P, T>(
        &self,
        control: &mut ControlLoop<R, P, T>,
    ) -> Result<TickReport, ControllerError<M, L>>
    where
        R: RangeSensor,
        P: PulseCounter,
        T: TelemetryReporter,
    {
        let pass = control.sense();
        let pending = self.take_pending();
        let now_ms = self.now_ms();
        self.with_controller(|controller| control.apply(controller, pending, pass, now_ms))
    }

    // A panic while holding a lock leaves the controller usable; the
    // state machine never holds a half-applied transition across calls.
    fn lock_controller(&self) -> MutexGuard<'_, BridgeController<M, L>> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, CommandQueue<COMMAND_QUEUE_DEPTH>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// StateProvider Implementation for Arc<SharedBridgeState>
// ============================================================================

impl<M, L> StateProvider for Arc<SharedBridgeState<M, L>>
where
    M: MotorDriver + Send + 'static,
    L: LightBankDriver + Send + 'static,
{
    fn state(&self) -> BridgeSnapshot {
        SharedBridgeState::state(self)
    }

    fn now_ms(&self) -> u64 {
        SharedBridgeState::now_ms(self)
    }

    fn apply_command(
        &self,
        cmd: BridgeCommand,
        source: CommandSource,
    ) -> Result<(CommandOutcome, BridgeState), ()> {
        let now_ms = SharedBridgeState::now_ms(self);
        self.with_controller(|controller| -> Result<_, ()> {
            let outcome = controller.apply_command(cmd, source, now_ms).map_err(|_| {
                log::error!("hardware failure applying {}", cmd.as_str());
            })?;
            Ok((outcome, controller.bridge_state()))
        })
    }

    fn submit(&self, cmd: BridgeCommand, source: CommandSource) -> bool {
        SharedBridgeState::submit(self, cmd, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hal::{MockLights, MockMotor, MockPulseCounter, MockRangeSensor, MockReporter};
    use crate::SystemStatus;

    type Shared = SharedBridgeState<MockMotor, MockLights>;

    fn shared() -> Shared {
        let mut controller = BridgeController::new(MockMotor::new(), MockLights::new());
        controller.initialize().unwrap();
        SharedBridgeState::new(controller)
    }

    #[test]
    fn test_shared_state_creation() {
        let state = shared();
        assert!(state.now_ms() < 100);
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn test_state_snapshot() {
        let snapshot = shared().state();
        assert_eq!(snapshot.bridge, BridgeState::Closed);
        assert_eq!(snapshot.status, SystemStatus::Ready);
    }

    #[test]
    fn test_stop_served_before_earlier_commands() {
        let state = shared();
        assert!(state.submit(BridgeCommand::Open, CommandSource::WebApi));
        assert!(state.submit(BridgeCommand::OverrideBoatDetected, CommandSource::Udp));
        assert!(state.submit(BridgeCommand::Stop, CommandSource::Udp));

        // The queued open is cancelled by the later stop.
        assert_eq!(state.take_pending().unwrap().command, BridgeCommand::Stop);
        assert_eq!(
            state.take_pending().unwrap().command,
            BridgeCommand::OverrideBoatDetected
        );
        assert!(state.take_pending().is_none());
    }

    #[test]
    fn test_full_queue_rejects_equal_priority() {
        let state = shared();
        for _ in 0..COMMAND_QUEUE_DEPTH {
            assert!(state.submit(BridgeCommand::OverrideBoatClear, CommandSource::Udp));
        }
        assert!(!state.submit(BridgeCommand::OverrideBoatClear, CommandSource::Udp));
        // Stop still gets in.
        assert!(state.submit(BridgeCommand::Stop, CommandSource::Udp));
        assert_eq!(state.pending_len(), COMMAND_QUEUE_DEPTH);
    }

    #[test]
    fn test_rearm_then_stop_stays_stopped() {
        let state = shared();
        state.with_controller(|c| c.stop(0)).unwrap();
        let mut control = ControlLoop::new(
            MockRangeSensor::new(),
            MockPulseCounter::new(),
            MockReporter::new(),
            &Config::default(),
        );

        assert!(state.submit(BridgeCommand::Rearm, CommandSource::Udp));
        assert!(state.submit(BridgeCommand::Stop, CommandSource::Udp));
        state.tick(&mut control).unwrap();
        state.tick(&mut control).unwrap();

        assert_eq!(state.state().bridge, BridgeState::Stopped);
        assert!(!state.with_controller(|c| c.motor().is_running()));
    }

    #[test]
    fn test_tick_services_one_command() {
        let state = shared();
        let config = Config::default();
        let mut control = ControlLoop::new(
            MockRangeSensor::new(),
            MockPulseCounter::new(),
            MockReporter::new(),
            &config,
        );
        state.submit(BridgeCommand::Open, CommandSource::Udp);
        state.submit(BridgeCommand::OverrideTrafficOccupied, CommandSource::Udp);

        let report = state.tick(&mut control).unwrap();
        assert!(report.command.unwrap().is_accepted());
        assert_eq!(state.pending_len(), 1);
        assert_eq!(state.state().bridge, BridgeState::Opening);
    }

    #[test]
    fn test_tick_polls_sensors_once() {
        let state = shared();
        let mut control = ControlLoop::new(
            MockRangeSensor::new(),
            MockPulseCounter::new(),
            MockReporter::new(),
            &Config::default(),
        );
        control.sensors_mut().set_distance(0, 3.0);

        let report = state.tick(&mut control).unwrap();
        assert!(report.auto_opened);
        assert_eq!(control.sensors_mut().polled, vec![0]);
        assert_eq!(state.state().bridge, BridgeState::Opening);
    }

    #[test]
    fn test_state_provider_apply_command() {
        let state = Arc::new(shared());
        let (outcome, bridge) =
            StateProvider::apply_command(&state, BridgeCommand::Open, CommandSource::WebApi)
                .unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(bridge, BridgeState::Opening);
        assert_eq!(StateProvider::state(&state).bridge, BridgeState::Opening);
    }

    #[test]
    fn test_state_provider_hardware_failure() {
        let mut controller = BridgeController::new(MockMotor::failing(), MockLights::new());
        let _ = controller.initialize();
        let state = Arc::new(SharedBridgeState::new(controller));
        assert!(
            StateProvider::apply_command(&state, BridgeCommand::Stop, CommandSource::WebApi)
                .is_err()
        );
    }
}

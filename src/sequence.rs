//! Timed actuation sub-states.
//!
//! The deck has no limit switches, so a sequence ends when a fixed actuation
//! time has elapsed. Instead of blocking for that time, the controller keeps a
//! [`Motion`] with a deadline and the scheduling loop advances it. Stop,
//! sensor polling and telemetry stay live while the deck moves.
//!
//! ```rust
//! use rs_drawbridge::sequence::Motion;
//! use rs_drawbridge::traits::MotorDirection;
//!
//! let motion = Motion::start(MotorDirection::Open, 1_000, 5_000);
//! assert!(!motion.is_complete(3_000));
//! assert!(motion.is_complete(6_000));
//!
//! let progress = motion.progress(3_500);
//! assert_eq!(progress.remaining_ms, 2_500);
//! assert_eq!(progress.percent(), 0.5);
//! ```

use crate::state::BridgeState;
use crate::traits::MotorDirection;

/// An actuation sequence in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Motion {
    /// Direction the motor is being driven.
    pub direction: MotorDirection,
    /// Timestamp the motor was started (milliseconds since start).
    pub started_ms: u64,
    /// Timestamp at which the deck is considered settled.
    pub deadline_ms: u64,
}

impl Motion {
    /// Start a motion at `now_ms` that lasts `duration_ms`.
    pub fn start(direction: MotorDirection, now_ms: u64, duration_ms: u64) -> Self {
        Self {
            direction,
            started_ms: now_ms,
            deadline_ms: now_ms.saturating_add(duration_ms),
        }
    }

    /// Transitional state shown while this motion runs.
    pub fn moving_state(&self) -> BridgeState {
        match self.direction {
            MotorDirection::Open => BridgeState::Opening,
            MotorDirection::Close | MotorDirection::Neutral => BridgeState::Closing,
        }
    }

    /// Settled state reached when this motion completes.
    pub fn settled_state(&self) -> BridgeState {
        match self.direction {
            MotorDirection::Open => BridgeState::Open,
            MotorDirection::Close | MotorDirection::Neutral => BridgeState::Closed,
        }
    }

    /// Returns true once the actuation time has elapsed.
    pub fn is_complete(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Progress snapshot for status reporting.
    pub fn progress(&self, now_ms: u64) -> MotionProgress {
        let total = self.deadline_ms - self.started_ms;
        let elapsed = now_ms.saturating_sub(self.started_ms).min(total);
        MotionProgress {
            direction: self.direction,
            elapsed_ms: elapsed,
            remaining_ms: total - elapsed,
            total_ms: total,
        }
    }
}

/// Progress information for a motion.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionProgress {
    /// Direction being driven.
    pub direction: MotorDirection,
    /// Time since the motor was started (milliseconds).
    pub elapsed_ms: u64,
    /// Time until the deck settles (milliseconds).
    pub remaining_ms: u64,
    /// Configured actuation time (milliseconds).
    pub total_ms: u64,
}

impl MotionProgress {
    /// Progress as a fraction (0.0 - 1.0).
    pub fn percent(&self) -> f32 {
        if self.total_ms == 0 {
            1.0
        } else {
            (self.elapsed_ms as f32 / self.total_ms as f32).min(1.0)
        }
    }
}

/// Hold-open timer for an automatic cycle.
///
/// Armed when an automatically triggered open settles. When it expires the
/// controller synthesizes a close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dwell {
    /// Timestamp the bridge settled open.
    pub started_ms: u64,
    /// Timestamp at which the automatic close fires.
    pub expires_ms: u64,
}

impl Dwell {
    /// Start a dwell at `now_ms` that lasts `duration_ms`.
    pub fn start(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            started_ms: now_ms,
            expires_ms: now_ms.saturating_add(duration_ms),
        }
    }

    /// Returns true once the hold time has elapsed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_ms
    }

    /// Time left before the automatic close (milliseconds).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_ms.saturating_sub(now_ms)
    }
}

//! Command types and priority system for the bridge controller.
//!
//! This module defines the command infrastructure for operating the bridge,
//! including command types, sources, priorities, and outcomes.
//!
//! # Command Flow
//!
//! Commands flow through a priority system before reaching the controller:
//!
//! 1. Commands arrive from different [`CommandSource`]s (UDP, web API, the
//!    automatic boat-detection policy)
//! 2. Each command has a [`CommandType`] that affects secondary priority ordering
//! 3. Stop commands from any source are automatically promoted to [`CommandSource::Emergency`]
//! 4. Commands can be wrapped as [`PrioritizedCommand`] for queue-based processing
//!
//! # Command Outcomes
//!
//! Applying a command never fails silently. The controller answers with a
//! [`CommandOutcome`]:
//!
//! - [`CommandOutcome::Accepted`]: the command took effect
//! - [`CommandOutcome::Rejected`]: nothing changed; [`RejectReason`] says why
//!
//! ```rust
//! use rs_drawbridge::{BridgeController, BridgeCommand, CommandSource, CommandOutcome};
//! use rs_drawbridge::hal::{MockLights, MockMotor};
//!
//! let mut bridge = BridgeController::new(MockMotor::new(), MockLights::new());
//! bridge.initialize().unwrap();
//!
//! let outcome = bridge.apply_command(BridgeCommand::Close, CommandSource::WebApi, 0).unwrap();
//! assert!(!outcome.is_accepted());
//! ```

use crate::state::BridgeState;

// ============================================================================
// Command Source Priority
// ============================================================================

/// Source of a command, ordered by priority (lower = lower priority).
///
/// # Priority Order (lowest to highest)
///
/// 1. [`Automatic`](Self::Automatic) - Synthesized by the boat-detection policy
/// 2. [`Udp`](Self::Udp) - Text commands on the UDP port
/// 3. [`WebApi`](Self::WebApi) - JSON API commands
/// 4. [`Local`](Self::Local) - Direct calls on the controller (firmware, tests)
/// 5. [`Emergency`](Self::Emergency) - Stop from any source
///
/// # Example
///
/// ```rust
/// use rs_drawbridge::CommandSource;
///
/// assert!(CommandSource::WebApi > CommandSource::Udp);
/// assert!(CommandSource::Emergency > CommandSource::WebApi);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandSource {
    /// Synthesized by the controller's own boat-detection policy.
    Automatic = 0,

    /// Datagram on the UDP command port.
    Udp = 1,

    /// JSON HTTP API.
    WebApi = 2,

    /// In-process caller using the controller's convenience methods.
    Local = 3,

    /// Stop from any source (highest priority).
    ///
    /// Stop commands from any [`CommandSource`] are automatically promoted
    /// to this level so they are always served first.
    Emergency = 4,
}

impl CommandSource {
    /// Returns the source as a snake_case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CommandSource::Automatic => "automatic",
            CommandSource::Udp => "udp",
            CommandSource::WebApi => "web_api",
            CommandSource::Local => "local",
            CommandSource::Emergency => "emergency",
        }
    }
}

/// Type of command, used for secondary priority ordering.
///
/// # Priority Order (lowest to highest)
///
/// 1. [`Override`](Self::Override) - Advisory sensor overrides
/// 2. [`Motion`](Self::Motion) - Open, close, toggle, re-arm
/// 3. [`Stop`](Self::Stop) - Always highest priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandType {
    /// Sets an advisory sensor state without moving anything.
    Override = 0,
    /// Starts an actuation sequence.
    Motion = 1,
    /// Safety stop.
    Stop = 2,
}

// ============================================================================
// Commands
// ============================================================================

/// A discrete operator or policy request.
///
/// State queries are not commands; read the controller's
/// [`query_state`](crate::BridgeController::query_state) instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BridgeCommand {
    /// Raise the deck. Valid from (Closed, Ready).
    Open,
    /// Lower the deck. Valid from (Open, Ready).
    Close,
    /// Open if Closed, close if Open.
    Toggle,
    /// Zero the motor, force both banks Red, hold in Stopped.
    Stop,
    /// Leave Stopped by running a close sequence.
    Rearm,
    /// Mark a boat as present.
    OverrideBoatDetected,
    /// Mark the waterway as clear.
    OverrideBoatClear,
    /// Mark the deck as free of road traffic.
    OverrideTrafficClear,
    /// Mark road traffic on the deck.
    OverrideTrafficOccupied,
}

impl BridgeCommand {
    /// Every command, in wire-name order.
    pub const ALL: [BridgeCommand; 9] = [
        BridgeCommand::Open,
        BridgeCommand::Close,
        BridgeCommand::Toggle,
        BridgeCommand::Stop,
        BridgeCommand::Rearm,
        BridgeCommand::OverrideBoatDetected,
        BridgeCommand::OverrideBoatClear,
        BridgeCommand::OverrideTrafficClear,
        BridgeCommand::OverrideTrafficOccupied,
    ];

    /// Text form used on the UDP port and in log lines.
    ///
    /// ```
    /// use rs_drawbridge::BridgeCommand;
    ///
    /// assert_eq!(BridgeCommand::OverrideBoatDetected.as_str(), "boat detected");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeCommand::Open => "open",
            BridgeCommand::Close => "close",
            BridgeCommand::Toggle => "toggle",
            BridgeCommand::Stop => "stop",
            BridgeCommand::Rearm => "rearm",
            BridgeCommand::OverrideBoatDetected => "boat detected",
            BridgeCommand::OverrideBoatClear => "boat clear",
            BridgeCommand::OverrideTrafficClear => "traffic clear",
            BridgeCommand::OverrideTrafficOccupied => "traffic occupied",
        }
    }

    /// Returns the command type for priority ordering.
    pub const fn command_type(&self) -> CommandType {
        match self {
            BridgeCommand::Stop => CommandType::Stop,
            BridgeCommand::Open
            | BridgeCommand::Close
            | BridgeCommand::Toggle
            | BridgeCommand::Rearm => CommandType::Motion,
            BridgeCommand::OverrideBoatDetected
            | BridgeCommand::OverrideBoatClear
            | BridgeCommand::OverrideTrafficClear
            | BridgeCommand::OverrideTrafficOccupied => CommandType::Override,
        }
    }

    /// Returns true if this is a stop command.
    pub const fn is_stop(&self) -> bool {
        matches!(self, BridgeCommand::Stop)
    }
}

// ============================================================================
// Prioritized Command Wrapper
// ============================================================================

/// A command with source and timestamp for priority ordering.
///
/// Commands are ordered by their effective priority, a tuple of
/// (source, command_type). Among equal priorities the earlier timestamp
/// is served first.
///
/// ```rust
/// use rs_drawbridge::{PrioritizedCommand, BridgeCommand, CommandSource};
///
/// // Stop over UDP gets promoted to Emergency
/// let stop = PrioritizedCommand::new(BridgeCommand::Stop, CommandSource::Udp, 0);
/// assert_eq!(stop.priority().0, CommandSource::Emergency);
///
/// let open = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::WebApi, 0);
/// assert!(stop > open);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PrioritizedCommand {
    /// The command to execute.
    pub command: BridgeCommand,
    /// Source that issued this command.
    pub source: CommandSource,
    /// Timestamp when the command was issued (milliseconds since start).
    pub timestamp_ms: u64,
}

impl PrioritizedCommand {
    /// Creates a new prioritized command with the given source and timestamp.
    pub fn new(command: BridgeCommand, source: CommandSource, timestamp_ms: u64) -> Self {
        Self {
            command,
            source,
            timestamp_ms,
        }
    }

    /// Get effective priority (source, command_type).
    /// Stop from any source gets promoted to Emergency level.
    pub fn priority(&self) -> Priority {
        let effective_source = if self.command.is_stop() {
            CommandSource::Emergency
        } else {
            self.source
        };

        (effective_source, self.command.command_type())
    }
}

impl Eq for PrioritizedCommand {}

impl PartialEq for PrioritizedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.priority() == other.priority() && self.timestamp_ms == other.timestamp_ms
    }
}

impl Ord for PrioritizedCommand {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| other.timestamp_ms.cmp(&self.timestamp_ms))
    }
}

impl PartialOrd for PrioritizedCommand {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// Command Outcomes
// ============================================================================

/// Result of applying a command to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandOutcome {
    /// The command took effect.
    Accepted,

    /// The command was ignored and no state changed.
    Rejected {
        /// Why the command was rejected.
        reason: RejectReason,
    },
}

impl CommandOutcome {
    /// Shorthand for a rejection.
    pub const fn rejected(reason: RejectReason) -> Self {
        CommandOutcome::Rejected { reason }
    }

    /// Returns true if the command took effect.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }

    /// Returns the rejection reason, if any.
    pub const fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CommandOutcome::Accepted => None,
            CommandOutcome::Rejected { reason } => Some(*reason),
        }
    }
}

/// Reason a command was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RejectReason {
    /// An actuation sequence is in flight.
    Busy,

    /// The bridge is not in the position the command starts from.
    InvalidState {
        /// Bridge state when the command arrived.
        state: BridgeState,
    },

    /// The controller is held by a stop and needs a re-arm.
    Stopped,

    /// The command queue is full and the command could not displace anything.
    QueueFull,
}

impl RejectReason {
    /// Returns the reason as a snake_case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Busy => "busy",
            RejectReason::InvalidState { .. } => "invalid_state",
            RejectReason::Stopped => "stopped",
            RejectReason::QueueFull => "queue_full",
        }
    }
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RejectReason::InvalidState { state } => {
                write!(f, "invalid_state ({})", state.as_str())
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Type alias for priority tuple (source, command_type).
pub type Priority = (CommandSource, CommandType);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_source_ordering() {
        assert!(CommandSource::Automatic < CommandSource::Udp);
        assert!(CommandSource::Udp < CommandSource::WebApi);
        assert!(CommandSource::WebApi < CommandSource::Local);
        assert!(CommandSource::Local < CommandSource::Emergency);
    }

    #[test]
    fn command_type_ordering() {
        assert!(CommandType::Override < CommandType::Motion);
        assert!(CommandType::Motion < CommandType::Stop);
    }

    #[test]
    fn command_types() {
        assert_eq!(BridgeCommand::Stop.command_type(), CommandType::Stop);
        assert_eq!(BridgeCommand::Rearm.command_type(), CommandType::Motion);
        assert_eq!(BridgeCommand::Toggle.command_type(), CommandType::Motion);
        assert_eq!(
            BridgeCommand::OverrideTrafficOccupied.command_type(),
            CommandType::Override
        );
    }

    #[test]
    fn wire_names_are_unique() {
        for (i, a) in BridgeCommand::ALL.iter().enumerate() {
            for b in &BridgeCommand::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn stop_promotes_to_emergency() {
        let pc = PrioritizedCommand::new(BridgeCommand::Stop, CommandSource::Automatic, 0);
        assert_eq!(pc.priority(), (CommandSource::Emergency, CommandType::Stop));
    }

    #[test]
    fn non_stop_keeps_source() {
        let pc = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 0);
        assert_eq!(pc.priority(), (CommandSource::Udp, CommandType::Motion));
    }

    #[test]
    fn ordering_by_source_then_age() {
        let udp = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 0);
        let web = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::WebApi, 5);
        assert!(web > udp);

        let early = PrioritizedCommand::new(BridgeCommand::Close, CommandSource::Udp, 10);
        let late = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 20);
        assert!(early > late);
    }

    #[test]
    fn equality_ignores_command_detail() {
        let a = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 100);
        let b = PrioritizedCommand::new(BridgeCommand::Close, CommandSource::Udp, 100);
        assert_eq!(a, b);

        let c = PrioritizedCommand::new(BridgeCommand::Open, CommandSource::Udp, 200);
        assert_ne!(a, c);
    }

    #[test]
    fn outcome_helpers() {
        assert!(CommandOutcome::Accepted.is_accepted());
        assert_eq!(CommandOutcome::Accepted.reject_reason(), None);

        let rejected = CommandOutcome::rejected(RejectReason::Busy);
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.reject_reason(), Some(RejectReason::Busy));
    }

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::InvalidState {
            state: BridgeState::Closed,
        };
        assert_eq!(format!("{}", reason), "invalid_state (closed)");
        assert_eq!(format!("{}", RejectReason::QueueFull), "queue_full");
    }
}

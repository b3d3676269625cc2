//! API response types for the HTTP command interface.

use serde::{Deserialize, Serialize};

use crate::{BridgeCommand, BridgeState, CommandOutcome};

// Re-export the shared request type from the messages module
pub use crate::messages::CommandRequest;

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was processed
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Result of a command request.
///
/// A rejected command is still a successful request: `accepted` is false
/// and `reason` says why nothing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command that was applied.
    pub command: BridgeCommand,
    /// Whether the command took effect.
    pub accepted: bool,
    /// Rejection reason (present when accepted=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Bridge state after the command.
    pub bridge: BridgeState,
}

impl CommandResponse {
    /// Build from a controller outcome.
    pub fn from_outcome(command: BridgeCommand, outcome: CommandOutcome, bridge: BridgeState) -> Self {
        Self {
            command,
            accepted: outcome.is_accepted(),
            reason: outcome.reject_reason().map(|r| r.as_str().to_string()),
            bridge,
        }
    }
}

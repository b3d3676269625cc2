//! Request types for the JSON command API.
//!
//! These types are `no_std` compatible and can be deserialized using either
//! `serde_json` (desktop) or `serde-json-core` (embedded).
//!
//! # Example
//!
//! ```
//! use rs_drawbridge::messages::CommandRequest;
//! use rs_drawbridge::BridgeCommand;
//!
//! #[cfg(feature = "std")]
//! {
//!     let req: CommandRequest = serde_json::from_str(r#"{"command": "boat detected"}"#).unwrap();
//!     assert_eq!(req.command(), Some(BridgeCommand::OverrideBoatDetected));
//! }
//! ```

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::commands::BridgeCommand;
use crate::parsing::parse_command_name;

/// Longest command name carried in a request body.
pub const MAX_COMMAND_NAME: usize = 32;

/// Generic command request.
///
/// The name uses the same grammar as the UDP port, so `"open"`,
/// `"boat_detected"` and `"override_traffic_clear"` are all accepted.
///
/// ```json
/// {"command": "toggle"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Command name.
    pub command: String<MAX_COMMAND_NAME>,
}

impl CommandRequest {
    /// Request for `cmd`, using its wire name.
    pub fn new(cmd: BridgeCommand) -> Self {
        let mut command = String::new();
        // Every wire name is shorter than MAX_COMMAND_NAME.
        let _ = command.push_str(cmd.as_str());
        Self { command }
    }

    /// The named command, or `None` if the name is not recognised.
    pub fn command(&self) -> Option<BridgeCommand> {
        parse_command_name(&self.command)
    }
}

/// Parse a [`CommandRequest`] from a JSON body.
///
/// ```
/// use rs_drawbridge::messages::parse_command_request;
/// use rs_drawbridge::BridgeCommand;
///
/// let req = parse_command_request(br#"{"command":"stop"}"#).unwrap();
/// assert_eq!(req.command(), Some(BridgeCommand::Stop));
///
/// assert!(parse_command_request(b"not json").is_none());
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_command_request(json: &[u8]) -> Option<CommandRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_wire_name() {
        for cmd in BridgeCommand::ALL {
            let req = CommandRequest::new(cmd);
            assert_eq!(req.command.as_str(), cmd.as_str());
            assert_eq!(req.command(), Some(cmd));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        let mut command = String::new();
        command.push_str("launch").unwrap();
        assert_eq!(CommandRequest { command }.command(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn serde_json_snake_case_name() {
        let req: CommandRequest =
            serde_json::from_str(r#"{"command": "override_traffic_occupied"}"#).unwrap();
        assert_eq!(req.command(), Some(BridgeCommand::OverrideTrafficOccupied));
    }

    #[cfg(feature = "std")]
    #[test]
    fn serialize_round_trips_name() {
        let json = serde_json::to_string(&CommandRequest::new(BridgeCommand::Rearm)).unwrap();
        assert_eq!(json, r#"{"command":"rearm"}"#);
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn core_parser_rejects_missing_field() {
        assert!(parse_command_request(br#"{"cmd":"open"}"#).is_none());
        assert!(parse_command_request(br#"{"command":"toggle"}"#).is_some());
    }
}

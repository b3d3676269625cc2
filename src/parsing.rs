//! Text command grammar for the UDP command port.
//!
//! One datagram carries one command. Matching ignores case, surrounding
//! whitespace, a leading `/`, and the separators ` `, `_` and `-`, so
//! `boat detected`, `boat_detected`, `/boatDetected` and
//! `override-boat-detected` all name the same command.
//!
//! ```
//! use rs_drawbridge::parsing::{parse_text_command, TextRequest};
//! use rs_drawbridge::BridgeCommand;
//!
//! assert_eq!(parse_text_command("open\n"), Some(TextRequest::Command(BridgeCommand::Open)));
//! assert_eq!(parse_text_command("/boatPassed"), Some(TextRequest::Command(BridgeCommand::OverrideBoatClear)));
//! assert_eq!(parse_text_command("STATE"), Some(TextRequest::State));
//! assert_eq!(parse_text_command("launch"), None);
//! ```

use core::fmt;

use heapless::String;

use crate::commands::{BridgeCommand, RejectReason};
use crate::controller::BridgeSnapshot;

/// Longest accepted command after separators are removed.
const MAX_COMMAND_LEN: usize = 32;

/// A parsed datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRequest {
    /// Queue a command.
    Command(BridgeCommand),
    /// Answer with the current state line.
    State,
}

/// Parse one text command. Returns `None` for anything unrecognised.
pub fn parse_text_command(input: &str) -> Option<TextRequest> {
    let key = compact(input)?;
    let request = match key.as_str() {
        "state" | "status" => TextRequest::State,
        other => TextRequest::Command(command_for(other)?),
    };
    Some(request)
}

/// Parse a command name, rejecting `state`.
///
/// Used by the JSON API, where the state query has its own route.
pub fn parse_command_name(input: &str) -> Option<BridgeCommand> {
    command_for(compact(input)?.as_str())
}

fn command_for(key: &str) -> Option<BridgeCommand> {
    let cmd = match key {
        "open" => BridgeCommand::Open,
        "close" => BridgeCommand::Close,
        "toggle" => BridgeCommand::Toggle,
        "stop" => BridgeCommand::Stop,
        "rearm" => BridgeCommand::Rearm,
        "boatdetected" | "overrideboatdetected" => BridgeCommand::OverrideBoatDetected,
        "boatclear" | "boatpassed" | "overrideboatclear" => BridgeCommand::OverrideBoatClear,
        "trafficclear" | "overridetrafficclear" => BridgeCommand::OverrideTrafficClear,
        "trafficoccupied" | "overridetrafficoccupied" => BridgeCommand::OverrideTrafficOccupied,
        _ => return None,
    };
    Some(cmd)
}

/// Lowercase and drop separators. `None` if empty or too long.
fn compact(input: &str) -> Option<String<MAX_COMMAND_LEN>> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);

    let mut out = String::new();
    for c in trimmed.chars() {
        if matches!(c, ' ' | '_' | '-' | '\t') {
            continue;
        }
        out.push(c.to_ascii_lowercase()).ok()?;
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// One-line answer sent back to the datagram's sender.
///
/// ```
/// use rs_drawbridge::parsing::Reply;
/// use rs_drawbridge::{BridgeCommand, RejectReason};
///
/// assert_eq!(Reply::Queued(BridgeCommand::OverrideBoatDetected).to_string(), "queued boat detected");
/// assert_eq!(Reply::Rejected(RejectReason::QueueFull).to_string(), "rejected queue_full");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reply<'a> {
    /// The command was placed in the queue.
    Queued(BridgeCommand),
    /// The command never reached the queue.
    Rejected(RejectReason),
    /// The datagram did not parse.
    UnknownCommand,
    /// Answer to `state`.
    State(&'a BridgeSnapshot),
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Queued(cmd) => write!(f, "queued {}", cmd.as_str()),
            Reply::Rejected(reason) => write!(f, "rejected {}", reason.as_str()),
            Reply::UnknownCommand => f.write_str("error unknown command"),
            Reply::State(snapshot) => write_state_line(f, snapshot),
        }
    }
}

fn write_state_line(f: &mut fmt::Formatter<'_>, s: &BridgeSnapshot) -> fmt::Result {
    write!(
        f,
        "state={} status={} boat={} traffic={} lights=boat:{},road:{}",
        s.bridge.as_str(),
        s.status.as_str(),
        s.boat_sensor.as_str(),
        s.traffic_sensor.as_str(),
        s.lights.boat.as_str(),
        s.lights.road.as_str(),
    )?;
    if let Some(motion) = &s.motion {
        write!(f, " remaining_ms={}", motion.remaining_ms)?;
    }
    if let Some(ms) = s.dwell_remaining_ms {
        write!(f, " dwell_ms={}", ms)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::ToString;

    use super::*;

    fn cmd(input: &str) -> Option<BridgeCommand> {
        match parse_text_command(input)? {
            TextRequest::Command(c) => Some(c),
            TextRequest::State => None,
        }
    }

    #[test]
    fn every_wire_name_parses_to_itself() {
        for c in BridgeCommand::ALL {
            assert_eq!(cmd(c.as_str()), Some(c), "{}", c.as_str());
        }
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        assert_eq!(cmd("  OPEN \r\n"), Some(BridgeCommand::Open));
        assert_eq!(cmd("Boat   Detected"), Some(BridgeCommand::OverrideBoatDetected));
    }

    #[test]
    fn separator_and_path_forms() {
        assert_eq!(cmd("traffic_occupied"), Some(BridgeCommand::OverrideTrafficOccupied));
        assert_eq!(cmd("/trafficClear"), Some(BridgeCommand::OverrideTrafficClear));
        assert_eq!(cmd("override-boat-clear"), Some(BridgeCommand::OverrideBoatClear));
        assert_eq!(cmd("boat passed"), Some(BridgeCommand::OverrideBoatClear));
    }

    #[test]
    fn state_query() {
        assert_eq!(parse_text_command("state"), Some(TextRequest::State));
        assert_eq!(parse_text_command("/status"), Some(TextRequest::State));
        assert_eq!(parse_command_name("state"), None);
    }

    #[test]
    fn junk_is_rejected() {
        assert_eq!(parse_text_command(""), None);
        assert_eq!(parse_text_command("   "), None);
        assert_eq!(parse_text_command("/"), None);
        assert_eq!(parse_text_command("open sesame"), None);
        assert_eq!(parse_text_command(&"x".repeat(64)), None);
    }

    #[test]
    fn unknown_reply_text() {
        assert_eq!(Reply::UnknownCommand.to_string(), "error unknown command");
    }

    #[test]
    fn state_line_for_fresh_controller() {
        let snapshot = BridgeSnapshot::default();
        assert_eq!(
            Reply::State(&snapshot).to_string(),
            "state=closed status=ready boat=clear traffic=clear lights=boat:red,road:green"
        );
    }
}

//! UDP command port.
//!
//! Each datagram carries one text command (see [`crate::parsing`]).
//! Commands go into the shared priority queue and are serviced by the
//! control loop; the sender gets a one-line receipt. `state` is answered
//! directly from the controller.
//!
//! [`handle_datagram`] is platform-agnostic; the ESP32 firmware calls it
//! from a non-blocking `std::net::UdpSocket`, the desktop server from
//! [`run_udp_listener`] (feature `udp`).

use crate::parsing::{parse_text_command, Reply, TextRequest};
use crate::{CommandSource, RejectReason};

use super::shared::StateProvider;

/// Largest datagram read from the socket.
pub const MAX_DATAGRAM: usize = 128;

/// Handle one datagram and return the reply text.
///
/// ```
/// use std::sync::Arc;
/// use rs_drawbridge::services::{handle_datagram, SharedBridgeState};
/// use rs_drawbridge::hal::{MockLights, MockMotor};
/// use rs_drawbridge::BridgeController;
///
/// let state = Arc::new(SharedBridgeState::new(BridgeController::new(MockMotor::new(), MockLights::new())));
/// assert_eq!(handle_datagram(&state, b"open\n"), "queued open");
/// assert_eq!(handle_datagram(&state, b"jump"), "error unknown command");
/// ```
pub fn handle_datagram<S: StateProvider>(state: &S, datagram: &[u8]) -> String {
    let Some(request) = core::str::from_utf8(datagram)
        .ok()
        .and_then(parse_text_command)
    else {
        log::debug!("udp: unknown command ({} bytes)", datagram.len());
        return Reply::UnknownCommand.to_string();
    };

    match request {
        TextRequest::State => {
            let snapshot = state.state();
            Reply::State(&snapshot).to_string()
        }
        TextRequest::Command(cmd) => {
            if state.submit(cmd, CommandSource::Udp) {
                Reply::Queued(cmd).to_string()
            } else {
                Reply::Rejected(RejectReason::QueueFull).to_string()
            }
        }
    }
}

/// Listen on the configured UDP port until the socket fails.
#[cfg(feature = "udp")]
pub async fn run_udp_listener<S: StateProvider>(
    state: S,
    config: &crate::config::UdpConfig,
) -> std::io::Result<()> {
    let socket = tokio::net::UdpSocket::bind(("0.0.0.0", config.port)).await?;
    log::info!("udp command port listening on {}", socket.local_addr()?);

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let reply = handle_datagram(&state, &buf[..len]);
        log::debug!("udp {} -> {}", peer, reply);
        if let Err(e) = socket.send_to(reply.as_bytes(), peer).await {
            log::warn!("udp reply to {} failed: {}", peer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockLights, MockMotor};
    use crate::services::{SharedBridgeState, COMMAND_QUEUE_DEPTH};
    use crate::{BridgeCommand, BridgeController};
    use std::sync::Arc;

    fn state() -> Arc<SharedBridgeState<MockMotor, MockLights>> {
        let mut controller = BridgeController::new(MockMotor::new(), MockLights::new());
        controller.initialize().unwrap();
        Arc::new(SharedBridgeState::new(controller))
    }

    #[test]
    fn command_is_queued_not_applied() {
        let s = state();
        assert_eq!(handle_datagram(&s, b"boat detected"), "queued boat detected");
        assert_eq!(s.pending_len(), 1);
        assert_eq!(
            s.take_pending().unwrap().command,
            BridgeCommand::OverrideBoatDetected
        );
    }

    #[test]
    fn state_reply() {
        let s = state();
        assert!(handle_datagram(&s, b"state").starts_with("state=closed status=ready"));
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn invalid_utf8_is_unknown() {
        assert_eq!(
            handle_datagram(&state(), &[0xff, 0xfe]),
            "error unknown command"
        );
    }

    #[test]
    fn full_queue_reply() {
        let s = state();
        for _ in 0..COMMAND_QUEUE_DEPTH {
            handle_datagram(&s, b"toggle");
        }
        assert_eq!(handle_datagram(&s, b"toggle"), "rejected queue_full");
    }
}

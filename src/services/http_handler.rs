//! Shared HTTP API handler logic for both desktop and ESP32.
//!
//! This module provides platform-agnostic HTTP request handling that can be
//! used by both Axum (desktop) and esp-idf-svc (ESP32) HTTP servers.
//!
//! # Endpoints
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | GET | `/api/state` | Current [`BridgeSnapshot`](crate::BridgeSnapshot) |
//! | POST | `/api/open`, `/api/close`, `/api/toggle`, `/api/stop`, `/api/rearm` | Motion and stop |
//! | POST | `/api/boat/detected`, `/api/boat/clear` | Boat sensor overrides |
//! | POST | `/api/traffic/clear`, `/api/traffic/occupied` | Traffic sensor overrides |
//! | POST | `/api/command` | `{"command": "<name>"}` using the UDP grammar |
//! | GET | `/open`, `/boatDetected`, `/boatPassed`, ... | Single-segment shortcuts |
//!
//! # Example
//!
//! ```ignore
//! use rs_drawbridge::services::HttpApiHandler;
//!
//! let handler = HttpApiHandler::new(shared_state);
//!
//! // In Axum handler:
//! let result = handler.handle_get_state();
//!
//! // In ESP-IDF handler:
//! let result = handler.route(true, req.uri(), &body);
//! resp.write_all(result.body().as_bytes())?;
//! ```

use serde::Serialize;

use crate::messages::parse_command_request;
use crate::parsing::parse_command_name;
use crate::{BridgeCommand, CommandSource};

use super::api::{ApiResponse, CommandResponse};
use super::shared::StateProvider;

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation: status code and JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    status: u16,
    body: String,
}

impl ApiResult {
    /// 200 with `data` wrapped in [`ApiResponse::ok`].
    pub fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &ApiResponse::ok(data))
    }

    /// Error status with a message wrapped in [`ApiResponse::err`].
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ApiResponse::<()>::err(message))
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: &str) -> Self {
        Self::error(400, message)
    }

    /// Create a not found (404) error.
    pub fn not_found() -> Self {
        Self::error(404, "Not found")
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(_) => Self {
                status: 500,
                body: String::from(r#"{"success":false,"error":"serialization failed"}"#),
            },
        }
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The JSON body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
#[cfg(feature = "web")]
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

/// Command addressed by a request path, if any.
///
/// ```
/// use rs_drawbridge::services::command_for_path;
/// use rs_drawbridge::BridgeCommand;
///
/// assert_eq!(command_for_path("/api/boat/detected"), Some(BridgeCommand::OverrideBoatDetected));
/// assert_eq!(command_for_path("/boatPassed?x=1"), Some(BridgeCommand::OverrideBoatClear));
/// assert_eq!(command_for_path("/api/state"), None);
/// ```
pub fn command_for_path(path: &str) -> Option<BridgeCommand> {
    let path = path.split('?').next().unwrap_or(path);
    let cmd = match path {
        "/api/open" => BridgeCommand::Open,
        "/api/close" => BridgeCommand::Close,
        "/api/toggle" => BridgeCommand::Toggle,
        "/api/stop" => BridgeCommand::Stop,
        "/api/rearm" => BridgeCommand::Rearm,
        "/api/boat/detected" => BridgeCommand::OverrideBoatDetected,
        "/api/boat/clear" => BridgeCommand::OverrideBoatClear,
        "/api/traffic/clear" => BridgeCommand::OverrideTrafficClear,
        "/api/traffic/occupied" => BridgeCommand::OverrideTrafficOccupied,
        other => {
            let segment = other.strip_prefix('/')?;
            if segment.contains('/') {
                return None;
            }
            return parse_command_name(segment);
        }
    };
    Some(cmd)
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// Shared HTTP API handler for both desktop and ESP32.
///
/// Contains the business logic for all REST API endpoints. Platform-specific
/// HTTP servers (Axum, esp-idf-svc) call these methods and adapt the results.
pub struct HttpApiHandler<S: StateProvider> {
    state: S,
}

impl<S: StateProvider> HttpApiHandler<S> {
    /// Create a new handler with the given state provider.
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The underlying state provider.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// GET /api/state
    pub fn handle_get_state(&self) -> ApiResult {
        ApiResult::ok(self.state.state())
    }

    /// Apply `cmd` immediately and report the outcome.
    pub fn handle_command(&self, cmd: BridgeCommand) -> ApiResult {
        match self.state.apply_command(cmd, CommandSource::WebApi) {
            Ok((outcome, bridge)) => {
                ApiResult::ok(CommandResponse::from_outcome(cmd, outcome, bridge))
            }
            Err(()) => ApiResult::error(500, "Controller hardware error"),
        }
    }

    /// POST /api/command
    ///
    /// Accepts JSON: `{"command": "toggle"}`
    pub fn handle_command_body(&self, body: &[u8]) -> ApiResult {
        let Some(req) = parse_command_request(body) else {
            return ApiResult::bad_request("Invalid command request");
        };
        match req.command() {
            Some(cmd) => self.handle_command(cmd),
            None => ApiResult::bad_request("Unknown command"),
        }
    }

    /// Dispatch one request. Commands accept both GET and POST, the way
    /// the single-segment shortcuts have always been used from a browser.
    pub fn route(&self, is_post: bool, path: &str, body: &[u8]) -> ApiResult {
        let bare = path.split('?').next().unwrap_or(path);
        match bare {
            "/api/state" | "/state" if !is_post => self.handle_get_state(),
            "/api/command" if is_post => self.handle_command_body(body),
            _ => match command_for_path(bare) {
                Some(cmd) if is_post || !bare.starts_with("/api/") => self.handle_command(cmd),
                _ => ApiResult::not_found(),
            },
        }
    }
}

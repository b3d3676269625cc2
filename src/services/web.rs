//! Axum-based HTTP server for the bridge controller API.
//!
//! Provides REST endpoints for:
//! - GET `/api/state` - Current bridge snapshot
//! - POST `/api/open`, `/api/close`, `/api/toggle` - Motion requests
//! - POST `/api/stop`, `/api/rearm` - Stop and recovery
//! - POST `/api/boat/detected|clear`, `/api/traffic/clear|occupied` - Sensor overrides
//! - POST `/api/command` - `{"command": "<name>"}`
//! - GET/POST `/<name>` - Single-segment shortcuts (`/open`, `/boatPassed`, ...)
//!
//! All request logic lives in [`HttpApiHandler`], shared with the ESP32 server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::traits::{LightBankDriver, MotorDriver};
use crate::BridgeCommand;

use super::http_handler::{ApiResult, HttpApiHandler};
use super::shared::{SharedBridgeState, StateProvider};

/// Router state: the shared handler.
pub type AppState<S> = Arc<HttpApiHandler<S>>;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/state - Returns current bridge state
async fn get_state<S: StateProvider + 'static>(State(h): State<AppState<S>>) -> ApiResult {
    h.handle_get_state()
}

/// POST /api/command - Apply a named command
async fn post_command<S: StateProvider + 'static>(
    State(h): State<AppState<S>>,
    body: Bytes,
) -> ApiResult {
    h.handle_command_body(&body)
}

/// GET /<name> - Shortcut form
async fn get_shortcut<S: StateProvider + 'static>(
    State(h): State<AppState<S>>,
    Path(name): Path<String>,
) -> ApiResult {
    h.route(false, &format!("/{}", name), &[])
}

/// POST /<name> - Shortcut form
async fn post_shortcut<S: StateProvider + 'static>(
    State(h): State<AppState<S>>,
    Path(name): Path<String>,
) -> ApiResult {
    h.route(true, &format!("/{}", name), &[])
}

/// Fallback handler for 404
async fn not_found() -> ApiResult {
    ApiResult::not_found()
}

fn command_route<S: StateProvider + 'static>(cmd: BridgeCommand) -> MethodRouter<AppState<S>> {
    post(move |State(h): State<AppState<S>>| async move { h.handle_command(cmd) })
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<S: StateProvider + 'static>(state: S, config: &WebServerConfig) -> Router {
    let handler = Arc::new(HttpApiHandler::new(state));

    let mut router = Router::new()
        .route("/api/state", get(get_state::<S>))
        .route("/api/command", post(post_command::<S>))
        .route("/api/open", command_route::<S>(BridgeCommand::Open))
        .route("/api/close", command_route::<S>(BridgeCommand::Close))
        .route("/api/toggle", command_route::<S>(BridgeCommand::Toggle))
        .route("/api/stop", command_route::<S>(BridgeCommand::Stop))
        .route("/api/rearm", command_route::<S>(BridgeCommand::Rearm))
        .route(
            "/api/boat/detected",
            command_route::<S>(BridgeCommand::OverrideBoatDetected),
        )
        .route(
            "/api/boat/clear",
            command_route::<S>(BridgeCommand::OverrideBoatClear),
        )
        .route(
            "/api/traffic/clear",
            command_route::<S>(BridgeCommand::OverrideTrafficClear),
        )
        .route(
            "/api/traffic/occupied",
            command_route::<S>(BridgeCommand::OverrideTrafficOccupied),
        )
        .route(
            "/:name",
            get(get_shortcut::<S>).post(post_shortcut::<S>),
        )
        .fallback(not_found)
        .with_state(handler);

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state
///
/// This function blocks until the server is shut down.
pub async fn run_server_with_state<M, L>(
    state: Arc<SharedBridgeState<M, L>>,
    config: WebServerConfig,
) -> Result<(), std::io::Error>
where
    M: MotorDriver + Send + 'static,
    L: LightBankDriver + Send + 'static,
{
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}

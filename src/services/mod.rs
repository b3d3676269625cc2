//! Network services for the HTTP API and UDP command port.
//!
//! This module provides network connectivity for the bridge controller:
//! - `shared`, `udp`: shared state and the datagram handler (any `std` build)
//! - `web` feature: Axum-based HTTP API server with JSON endpoints
//! - `udp` feature: tokio listener for the UDP command port
//! - `web` or `esp32-http`: the platform-agnostic HTTP handler
//!
//! All services reach the core `BridgeController` through a single
//! `SharedBridgeState<M, L>` wrapped in `Arc`.
//!
//! # Shared State Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_drawbridge::services::SharedBridgeState;
//!
//! let state = Arc::new(SharedBridgeState::new(controller));
//!
//! let web_router = build_router(Arc::clone(&state), &web_config);
//! tokio::spawn(run_udp_listener(Arc::clone(&state), &config.udp));
//! ```

pub mod shared;

pub mod udp;

#[cfg(any(feature = "web", feature = "esp32-http"))]
pub mod api;

#[cfg(any(feature = "web", feature = "esp32-http"))]
pub mod http_handler;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use shared::*;

pub use udp::*;

#[cfg(any(feature = "web", feature = "esp32-http"))]
pub use api::*;

#[cfg(any(feature = "web", feature = "esp32-http"))]
pub use http_handler::*;

#[cfg(feature = "web")]
pub use web::*;

//! HTTP server for the ESP32 bridge API.
//!
//! Every request is routed through the shared
//! [`HttpApiHandler`](crate::services::HttpApiHandler), so the firmware and
//! the desktop server answer identically. See that module for the endpoint
//! list.
//!
//! # Example
//!
//! ```ignore
//! use rs_drawbridge::hal::esp32::Esp32HttpServer;
//! use rs_drawbridge::services::{HttpApiHandler, SharedBridgeState};
//!
//! let shared = Arc::new(SharedBridgeState::new(controller));
//! let server = Esp32HttpServer::new(&config.web, Arc::clone(&shared))?;
//! ```

use std::sync::Arc;

use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Read, Write};

use crate::config::WebConfig;
use crate::services::{ApiResult, HttpApiHandler, StateProvider};

/// Largest request body read.
const MAX_BODY: usize = 256;

/// HTTP server for the bridge API.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

impl Esp32HttpServer {
    /// Start the server on `config.port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new<S>(config: &WebConfig, state: S) -> anyhow::Result<Self>
    where
        S: StateProvider + 'static,
    {
        let server_config = Configuration {
            http_port: config.port,
            uri_match_wildcard: true,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&server_config)?;
        let handler = Arc::new(HttpApiHandler::new(state));

        let for_get = Arc::clone(&handler);
        server.fn_handler("/*", Method::Get, move |req| {
            let result = for_get.route(false, req.uri(), &[]);
            respond(req, &result)
        })?;

        let for_post = Arc::clone(&handler);
        server.fn_handler("/*", Method::Post, move |mut req| {
            let mut buf = [0u8; MAX_BODY];
            let mut len = 0;
            while len < buf.len() {
                let n = req.read(&mut buf[len..])?;
                if n == 0 {
                    break;
                }
                len += n;
            }
            let result = for_post.route(true, req.uri(), &buf[..len]);
            respond(req, &result)
        })?;

        log::info!("http server on port {}", config.port);

        Ok(Self { _server: server })
    }
}

fn respond(
    req: Request<&mut EspHttpConnection<'_>>,
    result: &ApiResult,
) -> Result<(), EspIOError> {
    let mut resp = req.into_response(
        result.status(),
        None,
        &[("Content-Type", "application/json")],
    )?;
    resp.write_all(result.body().as_bytes())?;
    Ok(())
}

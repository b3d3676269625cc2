//! Desktop simulation of the drawbridge controller.
//!
//! Runs the full control loop against mock hardware and serves the same
//! HTTP API and UDP command port as the firmware:
//! - `GET  http://localhost:8080/api/state`
//! - `POST http://localhost:8080/api/open` (and `/api/close`, `/api/boat/detected`, ...)
//! - `echo toggle | nc -u localhost 1234`
//!
//! # Shared State
//!
//! HTTP, UDP and the control loop share one `BridgeController` through
//! `SharedBridgeState`. HTTP commands apply immediately; UDP commands are
//! queued and serviced one per loop iteration.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_server --features desktop
//! ```
//!
//! # Configuration
//!
//! Reads `bridge.toml` from the working directory when present. The
//! defaults match the firmware (HTTP on port 80), so a desktop setup
//! usually moves the web port, e.g.
//!
//! ```toml
//! [web]
//! port = 8080
//!
//! [bridge]
//! actuation_ms = 3000
//! dwell_ms = 10000
//! ```

use std::sync::Arc;
use std::time::Duration;

use rs_drawbridge::hal::{MockLights, MockMotor, MockPulseCounter};
use rs_drawbridge::scheduler::ControlLoop;
use rs_drawbridge::services::{run_server_with_state, run_udp_listener, SharedBridgeState, WebServerConfig};
use rs_drawbridge::telemetry::LogReporter;
use rs_drawbridge::{BridgeController, Config, Distance, RangeSensor, SensorId};

type DesktopState = SharedBridgeState<MockMotor, MockLights>;

/// Range sensors over an empty channel: every poll times out.
struct OpenWater;

impl RangeSensor for OpenWater {
    fn measure(&mut self, _sensor: SensorId) -> Option<Distance> {
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load("bridge.toml")?;
    log::info!(
        "{} ({}) desktop simulation",
        config.device.name,
        config.device.id
    );

    let mut controller =
        BridgeController::with_config(MockMotor::new(), MockLights::new(), &config.bridge);
    controller
        .initialize()
        .map_err(|e| anyhow::anyhow!("controller init failed: {}", e))?;

    // =========================================================================
    // SINGLE shared state for HTTP, UDP and the control loop
    // =========================================================================
    let shared = Arc::new(SharedBridgeState::new(controller));

    spawn_control_loop(Arc::clone(&shared), &config);

    if config.udp.enabled {
        let state_for_udp = Arc::clone(&shared);
        let udp_config = config.udp.clone();
        tokio::spawn(async move {
            if let Err(e) = run_udp_listener(state_for_udp, &udp_config).await {
                log::error!("udp listener stopped: {}", e);
            }
        });
    }

    if config.web.enabled {
        run_server_with_state(shared, WebServerConfig::from_config(&config.web)).await?;
    } else {
        log::info!("web server disabled, press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

/// Spawn the single control loop task.
///
/// The simulated sensors never see a boat, so no automatic cycle ever
/// starts. Overrides only change the reported sensor state and are
/// overwritten on the next pass; drive the deck with `/api/open`,
/// `/api/close` or the UDP motion commands.
fn spawn_control_loop(state: Arc<DesktopState>, config: &Config) {
    let mut control = ControlLoop::new(
        OpenWater,
        MockPulseCounter::new(),
        LogReporter,
        config,
    );
    let period = Duration::from_millis(u64::from(config.bridge.loop_interval_ms));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match state.tick(&mut control) {
                Ok(report) if report.transitioned() => {
                    log::info!(
                        "bridge {} -> {}",
                        report.state_before.as_str(),
                        report.state_after.as_str()
                    );
                }
                Ok(_) => {}
                Err(e) => log::error!("control loop: {}", e),
            }
        }
    });
}

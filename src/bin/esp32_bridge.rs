//! ESP32 drawbridge controller firmware.
//!
//! Runs a 50Hz control loop that on every iteration:
//! - services at most one queued command (UDP)
//! - settles the actuator when its run time is up, fires the dwell close
//! - polls the boat-detection sensors
//! - reports the shaft rotation rate once per telemetry window
//!
//! HTTP requests (feature `esp32-http`) are applied from the server task
//! under the same controller lock.
//!
//! # Build
//!
//! ```bash
//! # Hardware only
//! cargo build --release --features esp32
//!
//! # With soft AP, UDP command port and HTTP API
//! cargo build --release --features esp32-http
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin};
use esp_idf_hal::peripherals::Peripherals;
use rs_drawbridge::hal::esp32::{
    pins, BankPins, Esp32LightBanks, Esp32Motor, Esp32PulseCounter, Esp32RangeSensors, RangePins,
};
use rs_drawbridge::scheduler::ControlLoop;
use rs_drawbridge::services::SharedBridgeState;
use rs_drawbridge::telemetry::LogReporter;
use rs_drawbridge::{BridgeController, Config};

fn main() -> anyhow::Result<()> {
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // =========================================================================
    // Configuration
    // =========================================================================

    let config = Config::default();
    config.validate().map_err(|e| anyhow!("invalid config: {}", e))?;

    log::info!(
        "{} ({}) v{} starting",
        config.device.name,
        config.device.id,
        env!("CARGO_PKG_VERSION")
    );

    let peripherals = Peripherals::take()?;
    let io = peripherals.pins;

    // =========================================================================
    // Actuator (H-bridge on GPIO25/26)
    // =========================================================================

    let motor = Esp32Motor::new(
        io.gpio25,
        io.gpio26,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.ledc.channel1,
    )?;
    log::info!(
        "actuator ready (GPIO{}/{} PWM)",
        pins::OPEN_PWM,
        pins::CLOSE_PWM
    );

    // =========================================================================
    // Signal banks
    // =========================================================================

    let boat = vec![BankPins {
        red: AnyOutputPin::from(io.gpio4),
        yellow: AnyOutputPin::from(io.gpio16),
        green: AnyOutputPin::from(io.gpio17),
    }];
    let road = vec![BankPins {
        red: AnyOutputPin::from(io.gpio18),
        yellow: AnyOutputPin::from(io.gpio19),
        green: AnyOutputPin::from(io.gpio21),
    }];
    let lights = Esp32LightBanks::new(boat, road, &config.lights)?;
    log::info!(
        "signal banks ready: boat GPIO{}/{}/{}, road GPIO{}/{}/{}",
        pins::BOAT_RED,
        pins::BOAT_YELLOW,
        pins::BOAT_GREEN,
        pins::ROAD_RED,
        pins::ROAD_YELLOW,
        pins::ROAD_GREEN
    );

    // =========================================================================
    // Boat sensors and shaft encoder
    // =========================================================================

    let sensors = Esp32RangeSensors::new(
        vec![RangePins {
            trigger: AnyOutputPin::from(io.gpio22),
            echo: AnyInputPin::from(io.gpio23),
        }],
        &config.sensors,
    )?;
    let pulses = Esp32PulseCounter::new(AnyInputPin::from(io.gpio34))?;
    log::info!(
        "{} range sensor(s) (trigger GPIO{}, echo GPIO{}), shaft encoder on GPIO{}",
        sensors.len(),
        pins::SONAR0_TRIG,
        pins::SONAR0_ECHO,
        pins::ENCODER_A
    );

    // =========================================================================
    // Controller
    // =========================================================================

    let mut controller = BridgeController::with_config(motor, lights, &config.bridge);
    controller
        .initialize()
        .map_err(|e| anyhow!("controller init failed: {}", e))?;

    let shared = Arc::new(SharedBridgeState::new(controller));
    let mut control = ControlLoop::new(sensors, pulses, LogReporter, &config);

    // =========================================================================
    // Soft AP, HTTP and UDP
    // =========================================================================

    #[cfg(feature = "wifi")]
    let _ap = if config.wifi.enabled {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use rs_drawbridge::hal::esp32::Esp32AccessPoint;

        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        Some(Esp32AccessPoint::new(
            peripherals.modem,
            sysloop,
            Some(nvs),
            &config.wifi,
        )?)
    } else {
        log::info!("wifi disabled");
        None
    };

    #[cfg(feature = "esp32-http")]
    let _http = if config.web.enabled {
        use rs_drawbridge::hal::esp32::Esp32HttpServer;
        Some(Esp32HttpServer::new(&config.web, Arc::clone(&shared))?)
    } else {
        None
    };

    #[cfg(feature = "wifi")]
    let udp = if config.udp.enabled {
        let socket = std::net::UdpSocket::bind(("0.0.0.0", config.udp.port))?;
        socket.set_nonblocking(true)?;
        log::info!("udp command port {}", config.udp.port);
        Some(socket)
    } else {
        None
    };

    // =========================================================================
    // Main Control Loop (50Hz)
    // =========================================================================

    let interval = Duration::from_millis(u64::from(config.bridge.loop_interval_ms));
    log::info!("control loop every {:?}", interval);

    loop {
        let started = Instant::now();

        #[cfg(feature = "wifi")]
        if let Some(socket) = &udp {
            drain_udp(socket, &shared);
        }

        match shared.tick(&mut control) {
            Ok(report) if report.transitioned() => {
                log::debug!(
                    "tick: {} -> {}",
                    report.state_before.as_str(),
                    report.state_after.as_str()
                );
            }
            Ok(_) => {}
            Err(e) => log::error!("control loop: {}", e),
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}

/// Answer every datagram waiting on the socket.
#[cfg(feature = "wifi")]
fn drain_udp<S: rs_drawbridge::services::StateProvider>(socket: &std::net::UdpSocket, state: &S) {
    use rs_drawbridge::services::{handle_datagram, MAX_DATAGRAM};

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                let reply = handle_datagram(state, &buf[..len]);
                if let Err(e) = socket.send_to(reply.as_bytes(), peer) {
                    log::warn!("udp reply to {} failed: {}", peer, e);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return,
            Err(e) => {
                log::warn!("udp receive failed: {}", e);
                return;
            }
        }
    }
}

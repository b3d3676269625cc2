//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_drawbridge::config::{BridgeConfig, Config, SensorConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_bridge(BridgeConfig::default().with_actuation_ms(8_000))
//!     .with_sensors(SensorConfig::default().with_threshold_cm(25.0))
//!     .with_web(WebConfig::default().with_port(3000));
//! assert_eq!(config.bridge.actuation_ms, 8_000);
//! ```
//!
//! With the `config-file` feature a TOML file can override any subset of
//! the defaults:
//!
//! ```toml
//! [bridge]
//! actuation_ms = 6000
//! dwell_ms = 15000
//!
//! [sensors]
//! sensor_ids = [0, 1]
//! ```

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::traits::SensorId;

/// Maximum length for short config strings (SSIDs, names)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum number of boat-detection sensors.
pub const MAX_SENSORS: usize = 4;

/// Maximum number of physical banks on one side.
pub const MAX_BANKS_PER_SIDE: usize = 4;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Configured sensor list.
pub type SensorList = HVec<SensorId, MAX_SENSORS>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// A configuration value that the controller cannot run with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// `bridge.actuation_ms` is zero.
    ZeroActuationTime,
    /// `bridge.full_duty` is zero, negative or NaN.
    InvalidFullDuty(f32),
    /// `sensors.sensor_ids` is empty.
    NoSensors,
    /// `sensors.detection_threshold_cm` is zero, negative or NaN.
    InvalidThreshold(f32),
    /// A light bank count is outside `1..=MAX_BANKS_PER_SIDE`.
    BankCount {
        /// Which side was misconfigured ("boat" or "road").
        side: &'static str,
        /// The configured count.
        count: u8,
    },
    /// `telemetry.window_ms` is zero.
    ZeroTelemetryWindow,
    /// `telemetry.pulses_per_revolution` is zero.
    ZeroPulsesPerRevolution,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroActuationTime => write!(f, "bridge.actuation_ms must be > 0"),
            ConfigError::InvalidFullDuty(d) => {
                write!(f, "bridge.full_duty must be > 0 (got {})", d)
            }
            ConfigError::NoSensors => write!(f, "sensors.sensor_ids must list at least one sensor"),
            ConfigError::InvalidThreshold(t) => {
                write!(f, "sensors.detection_threshold_cm must be > 0 (got {})", t)
            }
            ConfigError::BankCount { side, count } => write!(
                f,
                "lights.{}_banks must be within 1..={} (got {})",
                side, MAX_BANKS_PER_SIDE, count
            ),
            ConfigError::ZeroTelemetryWindow => write!(f, "telemetry.window_ms must be > 0"),
            ConfigError::ZeroPulsesPerRevolution => {
                write!(f, "telemetry.pulses_per_revolution must be > 0")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Soft access point configuration
    pub wifi: WifiConfig,
    /// HTTP API configuration
    pub web: WebConfig,
    /// UDP command port configuration
    pub udp: UdpConfig,
    /// Actuation timing
    pub bridge: BridgeConfig,
    /// Boat-detection sensors
    pub sensors: SensorConfig,
    /// Signal bank cardinality
    pub lights: LightConfig,
    /// Rotation-rate sampling
    pub telemetry: TelemetryConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set UDP configuration
    pub fn with_udp(mut self, udp: UdpConfig) -> Self {
        self.udp = udp;
        self
    }

    /// Set bridge timing configuration
    pub fn with_bridge(mut self, bridge: BridgeConfig) -> Self {
        self.bridge = bridge;
        self
    }

    /// Set sensor configuration
    pub fn with_sensors(mut self, sensors: SensorConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Set light configuration
    pub fn with_lights(mut self, lights: LightConfig) -> Self {
        self.lights = lights;
        self
    }

    /// Set telemetry configuration
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Check every value the controller depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.actuation_ms == 0 {
            return Err(ConfigError::ZeroActuationTime);
        }
        // A zero duty would report Open with the deck still down.
        if !(self.bridge.full_duty > 0.0) {
            return Err(ConfigError::InvalidFullDuty(self.bridge.full_duty));
        }
        if self.sensors.sensor_ids.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        // `!(x > 0.0)` also catches NaN.
        if !(self.sensors.detection_threshold_cm > 0.0) {
            return Err(ConfigError::InvalidThreshold(
                self.sensors.detection_threshold_cm,
            ));
        }
        self.lights.validate()?;
        if self.telemetry.window_ms == 0 {
            return Err(ConfigError::ZeroTelemetryWindow);
        }
        if self.telemetry.pulses_per_revolution == 0 {
            return Err(ConfigError::ZeroPulsesPerRevolution);
        }
        Ok(())
    }
}

#[cfg(feature = "config-file")]
impl Config {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to the defaults.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            log::info!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            log::warn!(
                "{} not found, using default configuration",
                path.display()
            );
            Ok(Self::default())
        }
    }
}

// ============================================================================
// Web / UDP Config
// ============================================================================

/// HTTP API configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether the HTTP API is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable the HTTP API
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// UDP command port configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UdpConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether the UDP listener is enabled
    pub enabled: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            port: 1234,
            enabled: true,
        }
    }
}

impl UdpConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable the UDP listener
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Bridge Config
// ============================================================================

/// Actuation timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Fixed deck travel time in milliseconds
    pub actuation_ms: u32,
    /// Hold-open time of an automatic cycle in milliseconds
    pub dwell_ms: u32,
    /// Motor duty while moving (0.0 to 1.0)
    pub full_duty: f32,
    /// Control loop period in milliseconds
    pub loop_interval_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            actuation_ms: 5000,
            dwell_ms: 10_000,
            full_duty: 1.0,
            loop_interval_ms: 20,
        }
    }
}

impl BridgeConfig {
    /// Set the actuation time
    pub fn with_actuation_ms(mut self, ms: u32) -> Self {
        self.actuation_ms = ms;
        self
    }

    /// Set the automatic dwell time
    pub fn with_dwell_ms(mut self, ms: u32) -> Self {
        self.dwell_ms = ms;
        self
    }

    /// Set the motor duty while moving
    pub fn with_full_duty(mut self, duty: f32) -> Self {
        self.full_duty = duty.clamp(0.0, 1.0);
        self
    }

    /// Set the control loop period
    pub fn with_loop_interval_ms(mut self, ms: u32) -> Self {
        self.loop_interval_ms = ms;
        self
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// Boat-detection sensors
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// Maximum distance in centimeters counted as "boat present"
    pub detection_threshold_cm: f32,
    /// Sensors to poll, in evaluation order
    pub sensor_ids: SensorList,
    /// Echo timeout per ranging pulse in microseconds
    pub echo_timeout_us: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        let mut sensor_ids = SensorList::new();
        let _ = sensor_ids.push(0);
        Self {
            detection_threshold_cm: 10.0,
            sensor_ids,
            echo_timeout_us: 30_000,
        }
    }
}

impl SensorConfig {
    /// Set the detection threshold
    pub fn with_threshold_cm(mut self, cm: f32) -> Self {
        self.detection_threshold_cm = cm;
        self
    }

    /// Replace the sensor list. Ids beyond [`MAX_SENSORS`] are dropped.
    pub fn with_sensor_ids(mut self, ids: &[SensorId]) -> Self {
        self.sensor_ids.clear();
        for id in ids.iter().take(MAX_SENSORS) {
            let _ = self.sensor_ids.push(*id);
        }
        self
    }

    /// Set the echo timeout
    pub fn with_echo_timeout_us(mut self, us: u32) -> Self {
        self.echo_timeout_us = us;
        self
    }
}

// ============================================================================
// Light Config
// ============================================================================

/// Signal bank cardinality
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightConfig {
    /// Number of boat-side banks
    pub boat_banks: u8,
    /// Number of road-side banks
    pub road_banks: u8,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            boat_banks: 1,
            road_banks: 1,
        }
    }
}

impl LightConfig {
    /// Set the boat-side bank count
    pub fn with_boat_banks(mut self, count: u8) -> Self {
        self.boat_banks = count;
        self
    }

    /// Set the road-side bank count
    pub fn with_road_banks(mut self, count: u8) -> Self {
        self.road_banks = count;
        self
    }

    /// Check both bank counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (side, count) in [("boat", self.boat_banks), ("road", self.road_banks)] {
            if count == 0 || usize::from(count) > MAX_BANKS_PER_SIDE {
                return Err(ConfigError::BankCount { side, count });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Telemetry Config
// ============================================================================

/// Rotation-rate sampling
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TelemetryConfig {
    /// Sampling window in milliseconds
    pub window_ms: u32,
    /// Encoder pulses per shaft revolution
    pub pulses_per_revolution: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            pulses_per_revolution: 700,
        }
    }
}

impl TelemetryConfig {
    /// Set the sampling window
    pub fn with_window_ms(mut self, ms: u32) -> Self {
        self.window_ms = ms;
        self
    }

    /// Set the pulses per revolution
    pub fn with_pulses_per_revolution(mut self, ppr: u32) -> Self {
        self.pulses_per_revolution = ppr;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// Soft access point configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WifiConfig {
    /// Access point SSID
    pub ssid: ShortString,
    /// WPA2 password (empty = open network)
    pub password: ShortString,
    /// Radio channel
    pub channel: u8,
    /// Maximum simultaneous stations
    pub max_connections: u16,
    /// Whether the access point is started
    pub enabled: bool,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: short_string("ESP32_Bridge"),
            password: short_string("12345678"),
            channel: 1,
            max_connections: 4,
            enabled: true,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the radio channel
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the station limit
    pub fn with_max_connections(mut self, max: u16) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable the access point
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// True when the network is password protected
    pub fn is_secured(&self) -> bool {
        !self.password.is_empty()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Bridge identifier
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-drawbridge"),
            id: short_string("bridge1"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.web.port, 80);
        assert_eq!(config.udp.port, 1234);
        assert_eq!(config.bridge.actuation_ms, 5000);
        assert_eq!(config.bridge.dwell_ms, 10_000);
        assert_eq!(config.sensors.detection_threshold_cm, 10.0);
        assert_eq!(config.sensors.sensor_ids.as_slice(), &[0]);
        assert_eq!(config.telemetry.pulses_per_revolution, 700);
        assert_eq!(config.wifi.ssid.as_str(), "ESP32_Bridge");
        assert_eq!(config.wifi.password.as_str(), "12345678");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_udp(UdpConfig::default().with_port(4321))
            .with_lights(LightConfig::default().with_boat_banks(2).with_road_banks(2))
            .with_device(DeviceConfig::default().with_name("River St"));

        assert_eq!(config.udp.port, 4321);
        assert_eq!(config.lights.boat_banks, 2);
        assert_eq!(config.device.name.as_str(), "River St");
    }

    #[test]
    fn full_duty_clamped() {
        assert_eq!(BridgeConfig::default().with_full_duty(1.5).full_duty, 1.0);
        assert_eq!(BridgeConfig::default().with_full_duty(-0.5).full_duty, 0.0);
        assert_eq!(BridgeConfig::default().with_full_duty(0.6).full_duty, 0.6);
    }

    #[test]
    fn sensor_list_is_bounded() {
        let sensors = SensorConfig::default().with_sensor_ids(&[3, 1, 4, 1, 5, 9]);
        assert_eq!(sensors.sensor_ids.as_slice(), &[3, 1, 4, 1]);
    }

    #[test]
    fn rejects_zero_actuation() {
        let config = Config::default().with_bridge(BridgeConfig::default().with_actuation_ms(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroActuationTime));
    }

    #[test]
    fn rejects_non_positive_full_duty() {
        let config = Config::default().with_bridge(BridgeConfig::default().with_full_duty(0.0));
        assert_eq!(config.validate(), Err(ConfigError::InvalidFullDuty(0.0)));

        let mut config = Config::default();
        config.bridge.full_duty = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFullDuty(d)) if d.is_nan()
        ));
    }

    #[test]
    fn rejects_empty_sensor_list() {
        let config = Config::default().with_sensors(SensorConfig::default().with_sensor_ids(&[]));
        assert_eq!(config.validate(), Err(ConfigError::NoSensors));
    }

    #[test]
    fn rejects_bad_threshold() {
        let config = Config::default().with_sensors(SensorConfig::default().with_threshold_cm(0.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));

        let config =
            Config::default().with_sensors(SensorConfig::default().with_threshold_cm(f32::NAN));
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bank_counts_out_of_range() {
        let none = LightConfig::default().with_road_banks(0);
        assert_eq!(
            none.validate(),
            Err(ConfigError::BankCount {
                side: "road",
                count: 0
            })
        );

        let too_many = LightConfig::default().with_boat_banks(MAX_BANKS_PER_SIDE as u8 + 1);
        assert!(too_many.validate().is_err());

        let max = LightConfig::default()
            .with_boat_banks(MAX_BANKS_PER_SIDE as u8)
            .with_road_banks(MAX_BANKS_PER_SIDE as u8);
        assert!(max.validate().is_ok());

        // The limit doubles as a fixed container capacity.
        let banks: HVec<u8, MAX_BANKS_PER_SIDE> = HVec::new();
        assert_eq!(banks.capacity(), usize::from(max.boat_banks));
    }

    #[test]
    fn rejects_zero_telemetry_values() {
        let config = Config::default().with_telemetry(TelemetryConfig::default().with_window_ms(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroTelemetryWindow));

        let config = Config::default()
            .with_telemetry(TelemetryConfig::default().with_pulses_per_revolution(0));
        assert_eq!(config.validate(), Err(ConfigError::ZeroPulsesPerRevolution));
    }

    #[test]
    fn config_error_display() {
        let msg = format!(
            "{}",
            ConfigError::BankCount {
                side: "boat",
                count: 9
            }
        );
        assert_eq!(msg, "lights.boat_banks must be within 1..=4 (got 9)");
    }

    #[test]
    fn wifi_security() {
        assert!(WifiConfig::default().is_secured());
        assert!(!WifiConfig::default().with_password("").is_secured());
    }

    #[test]
    fn short_string_truncation() {
        let long = "x".repeat(100);
        assert_eq!(short_string(&long).len(), MAX_SHORT_STRING);
    }

    #[test]
    fn short_string_utf8_boundary() {
        // 63 ASCII bytes then a 2-byte char straddling the limit.
        let s = format!("{}é", "a".repeat(63));
        let hs = short_string(&s);
        assert_eq!(hs.len(), 63);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [bridge]
            actuation_ms = 6000

            [sensors]
            sensor_ids = [0, 2]
            detection_threshold_cm = 15.0
            "#,
        )
        .unwrap();

        assert_eq!(config.bridge.actuation_ms, 6000);
        assert_eq!(config.bridge.dwell_ms, 10_000);
        assert_eq!(config.sensors.sensor_ids.as_slice(), &[0, 2]);
        assert_eq!(config.sensors.detection_threshold_cm, 15.0);
        assert_eq!(config.udp.port, 1234);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_invalid_values_rejected() {
        let result = Config::from_toml_str(
            r#"
            [lights]
            boat_banks = 0
            "#,
        );
        assert!(result.is_err());

        let result = Config::from_toml_str(
            r#"
            [bridge]
            full_duty = 0.0
            "#,
        );
        assert!(result.is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/drawbridge.toml").unwrap();
        assert_eq!(config.bridge.actuation_ms, 5000);
    }
}

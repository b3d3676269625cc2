//! HC-SR04 ultrasonic range sensors.
//!
//! Ranging cycle per sensor:
//!
//! 1. 10 us trigger pulse
//! 2. wait for the echo line to rise
//! 3. time how long it stays high
//!
//! Either wait is bounded by the configured echo timeout (30 ms by default);
//! a timeout is reported as no reading. Sensors are indexed by their
//! position in the list handed to [`Esp32RangeSensors::new`], which is the
//! [`SensorId`] used in the configuration.

use super::Esp32Clock;
use crate::config::{SensorConfig, MAX_SENSORS};
use crate::traits::{Distance, RangeSensor, SensorId};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_hal::sys::EspError;

/// Trigger and echo pins for one sensor.
pub struct RangePins {
    /// Trigger output.
    pub trigger: AnyOutputPin,
    /// Echo input (level-shifted to 3.3V).
    pub echo: AnyInputPin,
}

struct Sensor<'d> {
    trigger: PinDriver<'d, AnyOutputPin, Output>,
    echo: PinDriver<'d, AnyInputPin, Input>,
}

/// One or more HC-SR04 sensors.
pub struct Esp32RangeSensors<'d> {
    sensors: heapless::Vec<Sensor<'d>, MAX_SENSORS>,
    echo_timeout_us: u32,
}

impl<'d> Esp32RangeSensors<'d> {
    /// Set up the sensors in id order. Pins beyond [`MAX_SENSORS`] are ignored.
    pub fn new(pins: Vec<RangePins>, config: &SensorConfig) -> Result<Self, EspError> {
        let mut sensors = heapless::Vec::new();
        for p in pins.into_iter().take(MAX_SENSORS) {
            let mut trigger = PinDriver::output(p.trigger)?;
            trigger.set_low()?;
            let echo = PinDriver::input(p.echo)?;
            let _ = sensors.push(Sensor { trigger, echo });
        }
        Ok(Self {
            sensors,
            echo_timeout_us: config.echo_timeout_us,
        })
    }

    /// Number of wired sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True if no sensor is wired.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Busy-wait until the echo line reads `high`, or `timeout_us` passes.
/// Returns the time the level was seen.
fn wait_for(echo: &PinDriver<'_, AnyInputPin, Input>, high: bool, timeout_us: u32) -> Option<i64> {
    let start = Esp32Clock::now_us();
    loop {
        let now = Esp32Clock::now_us();
        if echo.is_high() == high {
            return Some(now);
        }
        if now - start > i64::from(timeout_us) {
            return None;
        }
    }
}

impl RangeSensor for Esp32RangeSensors<'_> {
    fn measure(&mut self, sensor: SensorId) -> Option<Distance> {
        let timeout = self.echo_timeout_us;
        let s = self.sensors.get_mut(usize::from(sensor))?;

        s.trigger.set_low().ok()?;
        Ets::delay_us(2);
        s.trigger.set_high().ok()?;
        Ets::delay_us(10);
        s.trigger.set_low().ok()?;

        let rise = wait_for(&s.echo, true, timeout)?;
        let fall = wait_for(&s.echo, false, timeout)?;
        let width = u32::try_from(fall - rise).ok()?;
        Some(Distance::from_echo_us(width))
    }
}

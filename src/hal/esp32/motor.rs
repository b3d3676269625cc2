//! H-bridge deck actuator driver using ESP32 LEDC PWM.
//!
//! The H-bridge is controlled via two PWM signals:
//! - OPEN_PWM (GPIO25): drives the deck up
//! - CLOSE_PWM (GPIO26): drives the deck down
//!
//! Control logic:
//! - Open: OPEN_PWM = duty%, CLOSE_PWM = 0%
//! - Close: OPEN_PWM = 0%, CLOSE_PWM = duty%
//! - Neutral: Both = 0%
//!
//! The inactive side is always zeroed before the active side is raised, so
//! both halves of the bridge are never driven together.

use crate::traits::{MotorDirection, MotorDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Two-channel H-bridge actuator for ESP32.
///
/// Uses the LEDC peripheral for PWM generation at 20kHz with 10-bit resolution
/// (1024 duty steps).
///
/// # Example
///
/// ```ignore
/// use rs_drawbridge::hal::esp32::Esp32Motor;
/// use rs_drawbridge::traits::{MotorDriver, MotorDirection};
///
/// let peripherals = Peripherals::take()?;
/// let mut motor = Esp32Motor::new(
///     peripherals.pins.gpio25,
///     peripherals.pins.gpio26,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.ledc.channel1,
/// )?;
///
/// motor.drive(MotorDirection::Open, 1.0)?;
/// ```
pub struct Esp32Motor<'d> {
    open_pwm: LedcDriver<'d>,
    close_pwm: LedcDriver<'d>,
    duty: f32,
    direction: MotorDirection,
}

impl<'d> Esp32Motor<'d> {
    /// PWM frequency in Hz (20kHz is above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (10-bit = 1024 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits10;

    /// Maximum duty value for 10-bit resolution
    const MAX_DUTY: u32 = 1023;

    /// Creates a new actuator driver, initially neutral.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, OC, OCI, CC, CCI, OP, OPI, CP, CPI>(
        open_pin: OP,
        close_pin: CP,
        timer: T,
        open_channel: OC,
        close_channel: CC,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        OCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        OC: Peripheral<P = OCI> + 'd,
        CCI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        CC: Peripheral<P = CCI> + 'd,
        OPI: esp_idf_hal::gpio::OutputPin + 'd,
        OP: Peripheral<P = OPI> + 'd,
        CPI: esp_idf_hal::gpio::OutputPin + 'd,
        CP: Peripheral<P = CPI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let open_pwm = LedcDriver::new(open_channel, &timer_driver, open_pin)?;
        let close_pwm = LedcDriver::new(close_channel, &timer_driver, close_pin)?;

        let mut motor = Self {
            open_pwm,
            close_pwm,
            duty: 0.0,
            direction: MotorDirection::Neutral,
        };

        motor.apply_pwm()?;

        Ok(motor)
    }

    fn apply_pwm(&mut self) -> Result<(), esp_idf_hal::sys::EspError> {
        let duty = (self.duty * Self::MAX_DUTY as f32) as u32;

        match self.direction {
            MotorDirection::Open => {
                self.close_pwm.set_duty(0)?;
                self.open_pwm.set_duty(duty)?;
            }
            MotorDirection::Close => {
                self.open_pwm.set_duty(0)?;
                self.close_pwm.set_duty(duty)?;
            }
            MotorDirection::Neutral => {
                self.open_pwm.set_duty(0)?;
                self.close_pwm.set_duty(0)?;
            }
        }

        Ok(())
    }

    /// Current duty (0.0 to 1.0).
    #[inline]
    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Current drive direction.
    #[inline]
    pub fn direction(&self) -> MotorDirection {
        self.direction
    }
}

impl MotorDriver for Esp32Motor<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn drive(&mut self, direction: MotorDirection, duty: f32) -> Result<(), Self::Error> {
        self.direction = direction;
        self.duty = if direction == MotorDirection::Neutral {
            0.0
        } else {
            duty.clamp(0.0, 1.0)
        };
        self.apply_pwm()
    }
}

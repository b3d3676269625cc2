//! Shaft encoder pulse input.
//!
//! Rising edges on the encoder line are counted by a GPIO interrupt into a
//! `static` [`SharedPulseCounter`]; the control loop reads and clears it once
//! per telemetry window.
//!
//! # Wiring
//!
//! - Encoder A → GPIO34 (input only, external pull-up)

use core::ffi::c_void;
use core::ptr;

use crate::telemetry::SharedPulseCounter;
use crate::traits::PulseCounter;
use esp_idf_hal::gpio::{AnyInputPin, Input, PinDriver};
use esp_idf_hal::sys::{self, esp, EspError};

/// Pulse count written by the edge interrupt.
pub static SHAFT_PULSES: SharedPulseCounter = SharedPulseCounter::new();

unsafe extern "C" fn on_edge(_arg: *mut c_void) {
    SHAFT_PULSES.record_pulse();
}

/// Interrupt-driven pulse counter on one GPIO.
///
/// # Example
///
/// ```ignore
/// let mut pulses = Esp32PulseCounter::new(peripherals.pins.gpio34.into())?;
/// let count = pulses.take_and_reset();
/// ```
pub struct Esp32PulseCounter<'d> {
    pin: PinDriver<'d, AnyInputPin, Input>,
}

impl<'d> Esp32PulseCounter<'d> {
    /// Attach the edge interrupt to `pin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin or the ISR cannot be configured.
    pub fn new(pin: AnyInputPin) -> Result<Self, EspError> {
        let pin = PinDriver::input(pin)?;
        let gpio = pin.pin();

        // SAFETY: the handler only touches an atomic in a `static`, and the
        // registration is removed in `Drop`.
        unsafe {
            // Already installed is fine.
            let installed = sys::gpio_install_isr_service(0);
            if installed != sys::ESP_ERR_INVALID_STATE as sys::esp_err_t {
                esp!(installed)?;
            }
            esp!(sys::gpio_set_intr_type(
                gpio,
                sys::gpio_int_type_t_GPIO_INTR_POSEDGE
            ))?;
            esp!(sys::gpio_isr_handler_add(gpio, Some(on_edge), ptr::null_mut()))?;
            esp!(sys::gpio_intr_enable(gpio))?;
        }

        log::info!("shaft pulse counter on GPIO{}", gpio);
        Ok(Self { pin })
    }
}

impl PulseCounter for Esp32PulseCounter<'_> {
    fn take_and_reset(&mut self) -> u32 {
        SHAFT_PULSES.take()
    }
}

impl Drop for Esp32PulseCounter<'_> {
    fn drop(&mut self) {
        // SAFETY: removes the handler registered in `new`.
        unsafe {
            sys::gpio_isr_handler_remove(self.pin.pin());
        }
    }
}

//! Monotonic time from the ESP-IDF high-resolution timer.

use crate::traits::Clock;

/// Time since boot from `esp_timer_get_time()`.
///
/// The control loop uses millisecond resolution; echo timing in the range
/// sensors needs [`now_us`](Self::now_us).
///
/// ```ignore
/// use rs_drawbridge::hal::esp32::Esp32Clock;
/// use rs_drawbridge::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let tick_start = clock.now_ms();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    /// Microseconds since boot.
    #[inline]
    pub fn now_us() -> i64 {
        // SAFETY: plain read of the hardware timer, no side effects.
        unsafe { esp_idf_hal::sys::esp_timer_get_time() }
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        (Self::now_us() / 1000) as u64
    }
}

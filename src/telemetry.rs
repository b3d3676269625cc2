//! Rotation-rate telemetry.
//!
//! The actuator shaft encoder increments a [`SharedPulseCounter`] from its
//! edge interrupt. Once per sampling window the control loop reads and
//! clears it through [`RotationTelemetry::sample`] and hands the rate to a
//! [`TelemetryReporter`]. The rate is informational only; actuation stays
//! time-based.
//!
//! ```rust
//! use rs_drawbridge::telemetry::{RotationTelemetry, SharedPulseCounter};
//! use rs_drawbridge::config::TelemetryConfig;
//! use rs_drawbridge::hal::MockReporter;
//!
//! static PULSES: SharedPulseCounter = SharedPulseCounter::new();
//!
//! let mut telemetry = RotationTelemetry::new(&PULSES, MockReporter::new(), &TelemetryConfig::default());
//! for _ in 0..700 {
//!     PULSES.record_pulse();
//! }
//!
//! assert_eq!(telemetry.sample(500), None);
//! assert_eq!(telemetry.sample(1000), Some(60.0));
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::TelemetryConfig;
use crate::traits::{PulseCounter, TelemetryReporter};

/// Pulse count shared between an interrupt handler and the control loop.
///
/// Single writer, single reader; the read clears the count atomically so
/// no edge is lost or counted twice.
#[derive(Debug, Default)]
pub struct SharedPulseCounter {
    count: AtomicU32,
}

impl SharedPulseCounter {
    /// An empty counter, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Count one edge. Safe to call from interrupt context.
    #[inline]
    pub fn record_pulse(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count without clearing it.
    pub fn peek(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Read and clear.
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }
}

impl PulseCounter for &SharedPulseCounter {
    fn take_and_reset(&mut self) -> u32 {
        self.take()
    }
}

/// Convert a pulse count over `window_ms` to revolutions per minute.
///
/// ```
/// use rs_drawbridge::telemetry::rate_rpm;
///
/// assert_eq!(rate_rpm(700, 1000, 700), 60.0);
/// assert_eq!(rate_rpm(350, 500, 700), 60.0);
/// ```
pub fn rate_rpm(pulses: u32, window_ms: u32, pulses_per_revolution: u32) -> f32 {
    if window_ms == 0 || pulses_per_revolution == 0 {
        return 0.0;
    }
    let per_minute = pulses as f32 * (60_000.0 / window_ms as f32);
    per_minute / pulses_per_revolution as f32
}

/// Windowed sampler over a pulse counter.
pub struct RotationTelemetry<P: PulseCounter, T: TelemetryReporter> {
    counter: P,
    reporter: T,
    window_ms: u32,
    pulses_per_revolution: u32,
    window_start_ms: u64,
    last_rate: Option<f32>,
}

impl<P: PulseCounter, T: TelemetryReporter> RotationTelemetry<P, T> {
    /// Create a sampler whose first window starts at time 0.
    pub fn new(counter: P, reporter: T, config: &TelemetryConfig) -> Self {
        Self {
            counter,
            reporter,
            window_ms: config.window_ms,
            pulses_per_revolution: config.pulses_per_revolution,
            window_start_ms: 0,
            last_rate: None,
        }
    }

    /// Report once the current window has elapsed. Returns the reported rate.
    ///
    /// The rate covers the time actually elapsed since the counter was last
    /// cleared, so a late call does not inflate it.
    pub fn sample(&mut self, now_ms: u64) -> Option<f32> {
        let elapsed_ms = now_ms.saturating_sub(self.window_start_ms);
        if elapsed_ms < u64::from(self.window_ms) {
            return None;
        }
        let pulses = self.counter.take_and_reset();
        let measured_ms = u32::try_from(elapsed_ms).unwrap_or(u32::MAX);
        let rate = rate_rpm(pulses, measured_ms, self.pulses_per_revolution);
        self.reporter.report_rate(rate);
        self.window_start_ms = now_ms;
        self.last_rate = Some(rate);
        Some(rate)
    }

    /// Most recently reported rate.
    pub fn last_rate(&self) -> Option<f32> {
        self.last_rate
    }

    /// The reporter.
    pub fn reporter(&self) -> &T {
        &self.reporter
    }

    /// The pulse counter, mutably.
    pub fn counter_mut(&mut self) -> &mut P {
        &mut self.counter
    }
}

/// Reporter that writes one log line per window.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl TelemetryReporter for LogReporter {
    fn report_rate(&mut self, revolutions_per_minute: f32) {
        log::info!("rotation rate: {:.2} rpm", revolutions_per_minute);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockPulseCounter, MockReporter};

    fn telemetry() -> RotationTelemetry<MockPulseCounter, MockReporter> {
        RotationTelemetry::new(
            MockPulseCounter::new(),
            MockReporter::new(),
            &TelemetryConfig::default(),
        )
    }

    #[test]
    fn one_revolution_per_second_is_60_rpm() {
        assert_eq!(rate_rpm(700, 1000, 700), 60.0);
    }

    #[test]
    fn zero_divisors_report_zero() {
        assert_eq!(rate_rpm(100, 0, 700), 0.0);
        assert_eq!(rate_rpm(100, 1000, 0), 0.0);
    }

    #[test]
    fn reports_once_per_window() {
        let mut t = telemetry();
        t.counter_mut().add_pulses(1400);

        assert_eq!(t.sample(999), None);
        assert_eq!(t.sample(1000), Some(120.0));
        assert_eq!(t.sample(1500), None);
        assert_eq!(t.sample(2000), Some(0.0));

        assert_eq!(t.reporter().rates, vec![120.0, 0.0]);
        assert_eq!(t.last_rate(), Some(0.0));
    }

    #[test]
    fn late_sample_uses_measured_time() {
        let mut t = telemetry();
        t.counter_mut().add_pulses(1050);

        // 1.5 revolutions over a 1.5 s window.
        assert_eq!(t.sample(1500), Some(60.0));

        // The next window is measured from the late read.
        assert_eq!(t.sample(2499), None);
        assert_eq!(t.sample(2500), Some(0.0));
    }

    #[test]
    fn counter_read_only_at_window_end() {
        let mut t = telemetry();
        t.counter_mut().add_pulses(10);
        t.sample(100);
        t.sample(200);
        assert_eq!(t.counter_mut().reads, 0);
        t.sample(1000);
        assert_eq!(t.counter_mut().reads, 1);
    }

    #[test]
    fn shared_counter_take_clears() {
        let counter = SharedPulseCounter::new();
        counter.record_pulse();
        counter.record_pulse();
        assert_eq!(counter.peek(), 2);

        let mut handle = &counter;
        assert_eq!(handle.take_and_reset(), 2);
        assert_eq!(counter.peek(), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn shared_counter_across_threads() {
        use std::sync::Arc;

        let counter = Arc::new(SharedPulseCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.record_pulse();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.take(), 4000);
    }
}

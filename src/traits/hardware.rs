//! Hardware abstraction traits for the bridge actuator, signal lights, and sensors.
//!
//! This module defines the hardware interfaces the bridge controller drives.
//! Each platform (ESP32, desktop mocks) provides its own implementation.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorDriver`] | Bidirectional deck actuator (direction + duty) |
//! | [`LightBankDriver`] | Red/Yellow/Green signal banks for boat and road traffic |
//! | [`RangeSensor`] | Ultrasonic boat-detection ranging, polled |
//! | [`PulseCounter`] | Edge counter on the actuator shaft, read-and-reset |
//! | [`TelemetryReporter`] | Sink for the rotation rate once per window |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_drawbridge::traits::{MotorDriver, MotorDirection};
//! use rs_drawbridge::hal::MockMotor;
//!
//! let mut motor = MockMotor::new();
//! motor.drive(MotorDirection::Open, 1.0).unwrap();
//! assert_eq!(motor.direction, MotorDirection::Open);
//!
//! motor.stop().unwrap();
//! assert_eq!(motor.duty, 0.0);
//! ```

/// Direction the deck actuator is driven in.
///
/// # Default
///
/// Defaults to [`Neutral`](Self::Neutral) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotorDirection {
    /// Raise the deck.
    Open,
    /// Lower the deck.
    Close,
    /// No drive applied.
    #[default]
    Neutral,
}

impl MotorDirection {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_drawbridge::traits::MotorDirection;
    ///
    /// assert_eq!(MotorDirection::Open.as_str(), "open");
    /// assert_eq!(MotorDirection::Close.as_str(), "close");
    /// assert_eq!(MotorDirection::Neutral.as_str(), "neutral");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotorDirection::Open => "open",
            MotorDirection::Close => "close",
            MotorDirection::Neutral => "neutral",
        }
    }
}

/// Motor driver trait - abstracts the single bidirectional deck actuator.
///
/// `duty` is a fraction of full drive, 0.0 to 1.0. Implementations must clamp
/// out-of-range values and must never drive both directions at once.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_drawbridge::traits::{MotorDriver, MotorDirection};
///
/// struct MyHBridge { /* hardware handles */ }
///
/// impl MotorDriver for MyHBridge {
///     type Error = ();
///
///     fn drive(&mut self, direction: MotorDirection, duty: f32) -> Result<(), ()> {
///         let duty = (duty.clamp(0.0, 1.0) * 255.0) as u8;
///         // Select H-bridge leg, then set PWM...
///         Ok(())
///     }
/// }
/// ```
pub trait MotorDriver {
    /// Error type for motor operations.
    type Error;

    /// Command direction and duty cycle.
    fn drive(&mut self, direction: MotorDirection, duty: f32) -> Result<(), Self::Error>;

    /// Convenience method to remove all drive.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.drive(MotorDirection::Neutral, 0.0)
    }
}

/// Which traffic direction a signal bank faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BankSide {
    /// Signals for boats passing under the bridge.
    Boat,
    /// Signals for road traffic crossing the deck.
    Road,
}

impl BankSide {
    /// Both sides, boat first.
    pub const ALL: [BankSide; 2] = [BankSide::Boat, BankSide::Road];

    /// Returns the side as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BankSide::Boat => "boat",
            BankSide::Road => "road",
        }
    }
}

/// Signal color. Exactly one color is lit per bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LightColor {
    /// Stop.
    Red,
    /// Bridge in motion.
    Yellow,
    /// Proceed.
    Green,
}

impl LightColor {
    /// Returns the color as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LightColor::Red => "red",
            LightColor::Yellow => "yellow",
            LightColor::Green => "green",
        }
    }

    /// Returns true if this color grants right of way.
    #[inline]
    pub const fn is_go(&self) -> bool {
        matches!(self, LightColor::Green)
    }
}

/// Light bank driver trait.
///
/// Sets the single active color of every bank on one side. How many physical
/// banks a side has is a property of the implementation and its
/// [`LightConfig`](crate::config::LightConfig).
pub trait LightBankDriver {
    /// Error type for light operations.
    type Error;

    /// Light `color` on all banks of `side`, extinguishing the others.
    fn set_bank(&mut self, side: BankSide, color: LightColor) -> Result<(), Self::Error>;
}

/// Identifier of a configured range sensor.
pub type SensorId = u8;

/// Distance reported by a range sensor, in centimeters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distance(pub f32);

impl Distance {
    /// Creates a distance from centimeters.
    #[inline]
    pub const fn from_cm(cm: f32) -> Self {
        Self(cm)
    }

    /// Returns the distance in centimeters.
    #[inline]
    pub const fn cm(&self) -> f32 {
        self.0
    }

    /// Distance for an ultrasonic echo of `echo_us` microseconds (round trip).
    ///
    /// ```
    /// use rs_drawbridge::traits::Distance;
    ///
    /// // ~583 us of echo is about 10 cm.
    /// assert!((Distance::from_echo_us(583).cm() - 10.0).abs() < 0.01);
    /// ```
    #[inline]
    pub fn from_echo_us(echo_us: u32) -> Self {
        Self(echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0)
    }
}

/// Speed of sound in air at about 20 °C.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Range sensor trait for boat detection.
///
/// One call issues one ranging pulse. A missing echo within the sensor's
/// timeout is reported as `None` and is never an error.
pub trait RangeSensor {
    /// Measure the distance seen by `sensor`.
    fn measure(&mut self, sensor: SensorId) -> Option<Distance>;
}

/// Shaft pulse counter trait.
///
/// The counter accumulates independently of the control loop (usually from an
/// edge interrupt). Reading it clears it.
pub trait PulseCounter {
    /// Returns pulses counted since the previous call and resets the count.
    fn take_and_reset(&mut self) -> u32;
}

/// Receives the rotation rate once per sampling window.
pub trait TelemetryReporter {
    /// Report the actuator shaft rate in revolutions per minute.
    fn report_rate(&mut self, revolutions_per_minute: f32);
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for actuation timing.
///
/// # Example
///
/// ```rust
/// use rs_drawbridge::traits::Clock;
/// use rs_drawbridge::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_direction_default_is_neutral() {
        assert_eq!(MotorDirection::default(), MotorDirection::Neutral);
    }

    #[test]
    fn motor_direction_as_str() {
        assert_eq!(MotorDirection::Open.as_str(), "open");
        assert_eq!(MotorDirection::Close.as_str(), "close");
        assert_eq!(MotorDirection::Neutral.as_str(), "neutral");
    }

    #[test]
    fn only_green_is_go() {
        assert!(LightColor::Green.is_go());
        assert!(!LightColor::Yellow.is_go());
        assert!(!LightColor::Red.is_go());
    }

    #[test]
    fn bank_side_all_lists_boat_first() {
        assert_eq!(BankSide::ALL, [BankSide::Boat, BankSide::Road]);
        assert_eq!(BankSide::Road.as_str(), "road");
    }

    #[test]
    fn distance_ordering() {
        assert!(Distance::from_cm(5.0) < Distance::from_cm(10.0));
        assert_eq!(Distance::from_cm(7.5).cm(), 7.5);
    }

    struct CountingMotor {
        calls: usize,
        last: (MotorDirection, f32),
    }

    impl MotorDriver for CountingMotor {
        type Error = ();

        fn drive(&mut self, direction: MotorDirection, duty: f32) -> Result<(), ()> {
            self.calls += 1;
            self.last = (direction, duty);
            Ok(())
        }
    }

    #[test]
    fn default_stop_drives_neutral_at_zero() {
        let mut motor = CountingMotor {
            calls: 0,
            last: (MotorDirection::Open, 1.0),
        };
        motor.stop().unwrap();
        assert_eq!(motor.calls, 1);
        assert_eq!(motor.last, (MotorDirection::Neutral, 0.0));
    }
}

//! GPIO signal banks.
//!
//! Each bank is three outputs (red, yellow, green) driving one signal head.
//! A side (boat or road) has between one and
//! [`MAX_BANKS_PER_SIDE`](crate::config::MAX_BANKS_PER_SIDE) banks, all
//! showing the same color. The count comes from [`LightConfig`] and must
//! match the pins handed in.

use crate::config::{LightConfig, MAX_BANKS_PER_SIDE};
use crate::traits::{BankSide, LightBankDriver, LightColor};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::sys::EspError;

/// Pins for one signal head.
pub struct BankPins {
    /// Red lamp.
    pub red: AnyOutputPin,
    /// Yellow lamp.
    pub yellow: AnyOutputPin,
    /// Green lamp.
    pub green: AnyOutputPin,
}

struct Bank<'d> {
    red: PinDriver<'d, AnyOutputPin, Output>,
    yellow: PinDriver<'d, AnyOutputPin, Output>,
    green: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Bank<'d> {
    fn new(pins: BankPins) -> Result<Self, EspError> {
        let mut bank = Self {
            red: PinDriver::output(pins.red)?,
            yellow: PinDriver::output(pins.yellow)?,
            green: PinDriver::output(pins.green)?,
        };
        bank.show(LightColor::Red)?;
        Ok(bank)
    }

    /// Lamps are mutually exclusive: everything off, then the one lamp on.
    fn show(&mut self, color: LightColor) -> Result<(), EspError> {
        self.red.set_low()?;
        self.yellow.set_low()?;
        self.green.set_low()?;
        match color {
            LightColor::Red => self.red.set_high(),
            LightColor::Yellow => self.yellow.set_high(),
            LightColor::Green => self.green.set_high(),
        }
    }
}

/// Setup failure for [`Esp32LightBanks`].
#[derive(Debug)]
pub enum LightSetupError {
    /// Pin count for a side does not match the configured bank count.
    BankCount {
        /// Side with the mismatch.
        side: BankSide,
        /// Configured count.
        expected: u8,
        /// Banks wired.
        wired: usize,
    },
    /// GPIO driver error.
    Gpio(EspError),
}

impl core::fmt::Display for LightSetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LightSetupError::BankCount {
                side,
                expected,
                wired,
            } => write!(
                f,
                "{} side configured for {} banks but {} wired",
                side.as_str(),
                expected,
                wired
            ),
            LightSetupError::Gpio(e) => write!(f, "gpio: {}", e),
        }
    }
}

impl std::error::Error for LightSetupError {}

impl From<EspError> for LightSetupError {
    fn from(e: EspError) -> Self {
        LightSetupError::Gpio(e)
    }
}

/// Boat-side and road-side signal banks on GPIO.
///
/// Every bank comes up Red.
///
/// # Example
///
/// ```ignore
/// let boat = vec![BankPins { red: p.pins.gpio4.into(), yellow: p.pins.gpio16.into(), green: p.pins.gpio17.into() }];
/// let road = vec![BankPins { red: p.pins.gpio18.into(), yellow: p.pins.gpio19.into(), green: p.pins.gpio21.into() }];
/// let lights = Esp32LightBanks::new(boat, road, &config.lights)?;
/// ```
pub struct Esp32LightBanks<'d> {
    boat: heapless::Vec<Bank<'d>, MAX_BANKS_PER_SIDE>,
    road: heapless::Vec<Bank<'d>, MAX_BANKS_PER_SIDE>,
}

impl<'d> Esp32LightBanks<'d> {
    /// Drive the given pins, checking them against `config`.
    pub fn new(
        boat: Vec<BankPins>,
        road: Vec<BankPins>,
        config: &LightConfig,
    ) -> Result<Self, LightSetupError> {
        Ok(Self {
            boat: Self::side(BankSide::Boat, boat, config.boat_banks)?,
            road: Self::side(BankSide::Road, road, config.road_banks)?,
        })
    }

    fn side(
        side: BankSide,
        pins: Vec<BankPins>,
        expected: u8,
    ) -> Result<heapless::Vec<Bank<'d>, MAX_BANKS_PER_SIDE>, LightSetupError> {
        let wired = pins.len();
        if wired != usize::from(expected) || wired == 0 || wired > MAX_BANKS_PER_SIDE {
            return Err(LightSetupError::BankCount {
                side,
                expected,
                wired,
            });
        }
        let mut banks = heapless::Vec::new();
        for p in pins {
            // Length checked above.
            let _ = banks.push(Bank::new(p)?);
        }
        Ok(banks)
    }

    /// Number of banks on `side`.
    pub fn bank_count(&self, side: BankSide) -> usize {
        match side {
            BankSide::Boat => self.boat.len(),
            BankSide::Road => self.road.len(),
        }
    }
}

impl LightBankDriver for Esp32LightBanks<'_> {
    type Error = EspError;

    fn set_bank(&mut self, side: BankSide, color: LightColor) -> Result<(), Self::Error> {
        let banks = match side {
            BankSide::Boat => &mut self.boat,
            BankSide::Road => &mut self.road,
        };
        for bank in banks.iter_mut() {
            bank.show(color)?;
        }
        Ok(())
    }
}

//! Bridge state types and the signal-light derivation table.
//!
//! The light aspect shown to boats and road traffic is a pure function of
//! [`BridgeState`]. [`LightAspect::for_state`] is the only place colors are
//! chosen; the controller never sets a bank independently of a state change.
//!
//! | BridgeState | Boat bank | Road bank |
//! |---|---|---|
//! | Closed | Red | Green |
//! | Open | Green | Red |
//! | Opening / Closing | Yellow | Red |
//! | Stopped | Red | Red |

use crate::traits::{BankSide, LightColor};

/// Physical position of the bridge deck, settled or in motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BridgeState {
    /// Deck seated, road open. Assumed at power-on.
    #[default]
    Closed,
    /// Deck rising.
    Opening,
    /// Deck fully raised, waterway open.
    Open,
    /// Deck lowering.
    Closing,
    /// Emergency stop; position unknown until re-armed.
    Stopped,
}

impl BridgeState {
    /// Returns the state as a lowercase string.
    ///
    /// ```
    /// use rs_drawbridge::BridgeState;
    ///
    /// assert_eq!(BridgeState::Opening.as_str(), "opening");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Closed => "closed",
            BridgeState::Opening => "opening",
            BridgeState::Open => "open",
            BridgeState::Closing => "closing",
            BridgeState::Stopped => "stopped",
        }
    }

    /// Returns true for the at-rest positions (Closed, Open).
    #[inline]
    pub const fn is_settled(&self) -> bool {
        matches!(self, BridgeState::Closed | BridgeState::Open)
    }

    /// Returns true while the deck is travelling.
    #[inline]
    pub const fn is_transitional(&self) -> bool {
        matches!(self, BridgeState::Opening | BridgeState::Closing)
    }
}

/// Re-entrancy guard for actuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SystemStatus {
    /// Idle, new sequences may start.
    #[default]
    Ready,
    /// An actuation sequence is in flight.
    Moving,
    /// Held by the safety stop.
    Stopped,
}

impl SystemStatus {
    /// Returns the status as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Ready => "ready",
            SystemStatus::Moving => "moving",
            SystemStatus::Stopped => "stopped",
        }
    }
}

/// Most recent boat-detection result. Advisory only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BoatSensorState {
    /// Nothing in range.
    #[default]
    Clear,
    /// A boat is in range (or an operator said so).
    Detected,
}

impl BoatSensorState {
    /// Returns the state as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BoatSensorState::Clear => "clear",
            BoatSensorState::Detected => "detected",
        }
    }
}

/// Operator-reported road traffic on the deck. Advisory only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrafficSensorState {
    /// Deck reported clear of vehicles.
    #[default]
    Clear,
    /// Vehicles reported on the deck.
    Occupied,
}

impl TrafficSensorState {
    /// Returns the state as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrafficSensorState::Clear => "clear",
            TrafficSensorState::Occupied => "occupied",
        }
    }
}

/// Colors shown on both sides at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightAspect {
    /// Boat-side bank color.
    pub boat: LightColor,
    /// Road-side bank color.
    pub road: LightColor,
}

impl LightAspect {
    /// Fail-safe aspect: nobody has right of way.
    pub const ALL_RED: LightAspect = LightAspect {
        boat: LightColor::Red,
        road: LightColor::Red,
    };

    /// The aspect required for `state`.
    ///
    /// ```
    /// use rs_drawbridge::{BridgeState, LightAspect};
    /// use rs_drawbridge::traits::LightColor;
    ///
    /// let aspect = LightAspect::for_state(BridgeState::Closed);
    /// assert_eq!(aspect.boat, LightColor::Red);
    /// assert_eq!(aspect.road, LightColor::Green);
    /// ```
    pub const fn for_state(state: BridgeState) -> Self {
        match state {
            BridgeState::Closed => LightAspect {
                boat: LightColor::Red,
                road: LightColor::Green,
            },
            BridgeState::Open => LightAspect {
                boat: LightColor::Green,
                road: LightColor::Red,
            },
            BridgeState::Opening | BridgeState::Closing => LightAspect {
                boat: LightColor::Yellow,
                road: LightColor::Red,
            },
            BridgeState::Stopped => Self::ALL_RED,
        }
    }

    /// Color for one side.
    #[inline]
    pub const fn color(&self, side: BankSide) -> LightColor {
        match side {
            BankSide::Boat => self.boat,
            BankSide::Road => self.road,
        }
    }

    /// Sides in the order they must be written so that no intermediate
    /// combination grants right of way to both: sides turning Red first.
    pub fn write_order(&self) -> [BankSide; 2] {
        if self.road == LightColor::Red {
            [BankSide::Road, BankSide::Boat]
        } else {
            [BankSide::Boat, BankSide::Road]
        }
    }
}

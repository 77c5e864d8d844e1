use derive_more::{Constructor, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display as StrumDisplay, EnumString};

/// Value Object - price
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

/// Value Object - millisecond timestamp since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Deref, Constructor, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn from_millis(value: u64) -> Self {
        Self(value)
    }

    /// Start of the grid bucket of width `duration_ms` containing this instant.
    /// A zero width has no grid and leaves the instant unchanged.
    pub fn floor_to(&self, duration_ms: u64) -> Self {
        Self(self.0 - self.0.checked_rem(duration_ms).unwrap_or(0))
    }

    pub fn offset(&self, delta_ms: u64) -> Self {
        Self(self.0 + delta_ms)
    }
}

/// Value Object - OHLC data of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

impl Ohlc {
    /// All four fields at the same price.
    pub fn flat(price: Price) -> Self {
        Self { open: price, high: price, low: price, close: price }
    }

    /// `low <= min(open, close) <= max(open, close) <= high`
    pub fn is_valid(&self) -> bool {
        self.low <= self.open && self.low <= self.close && self.high >= self.open && self.high >= self.close
    }
}

/// Directional override pushed in by the admin control channel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    StrumDisplay,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum Signal {
    #[default]
    #[strum(serialize = "NEUTRAL")]
    #[serde(rename = "NEUTRAL")]
    Neutral,

    #[strum(serialize = "UP")]
    #[serde(rename = "UP")]
    Up,

    #[strum(serialize = "DOWN")]
    #[serde(rename = "DOWN")]
    Down,
}

impl Signal {
    /// Unrecognized literals fall back to `Neutral`.
    pub fn parse_lenient(literal: &str) -> Self {
        literal.parse().unwrap_or_default()
    }

    pub fn direction(&self) -> f64 {
        match self {
            Self::Neutral => 0.0,
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

/// Multiplier applied to the bias force. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Into, Deref, Display, Serialize)]
#[display(fmt = "{}x", _0)]
pub struct Volatility(f64);

impl Volatility {
    pub const DEFAULT: f64 = 1.0;

    /// Zero, negative and non-finite input collapse to the neutral default.
    pub fn new(multiplier: f64) -> Self {
        if multiplier.is_finite() && multiplier > 0.0 { Self(multiplier) } else { Self(Self::DEFAULT) }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Volatility {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<f64> for Volatility {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_literals_parse_exactly() {
        assert_eq!(Signal::parse_lenient("UP"), Signal::Up);
        assert_eq!(Signal::parse_lenient("DOWN"), Signal::Down);
        assert_eq!(Signal::parse_lenient("NEUTRAL"), Signal::Neutral);
        assert_eq!(Signal::parse_lenient("up"), Signal::Neutral);
        assert_eq!(Signal::parse_lenient("SIDEWAYS"), Signal::Neutral);
        assert_eq!(Signal::Down.to_string(), "DOWN");
    }

    #[test]
    fn volatility_falls_back_on_non_positive() {
        assert_eq!(Volatility::new(0.0).value(), 1.0);
        assert_eq!(Volatility::new(-3.0).value(), 1.0);
        assert_eq!(Volatility::new(f64::NAN).value(), 1.0);
        assert_eq!(Volatility::new(2.5).value(), 2.5);
    }

    #[test]
    fn timestamp_floor_aligns_to_grid() {
        let ts = Timestamp::from_millis(1_700_000_003_500);
        assert_eq!(ts.floor_to(8_000).value(), 1_700_000_000_000);
        assert_eq!(ts.floor_to(8_000).value() % 8_000, 0);
        assert_eq!(ts.floor_to(0), ts);
    }
}

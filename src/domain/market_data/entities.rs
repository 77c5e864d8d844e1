use super::value_objects::{Ohlc, Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Domain entity - Candle. `timestamp` is the grid-aligned bucket start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Timestamp,
    pub ohlc: Ohlc,
}

impl Candle {
    pub fn new(timestamp: Timestamp, ohlc: Ohlc) -> Self {
        Self { timestamp, ohlc }
    }

    /// Fresh bucket: every field equals the price at bucket start.
    pub fn flat(timestamp: Timestamp, price: Price) -> Self {
        Self { timestamp, ohlc: Ohlc::flat(price) }
    }

    /// Widen the range and replace the close with a new live price.
    pub fn record(&mut self, price: Price) {
        if price > self.ohlc.high {
            self.ohlc.high = price;
        }
        if price < self.ohlc.low {
            self.ohlc.low = price;
        }
        self.ohlc.close = price;
    }

    pub fn end_time(&self, duration_ms: u64) -> Timestamp {
        self.timestamp.offset(duration_ms)
    }

    pub fn is_bullish(&self) -> bool {
        self.ohlc.close >= self.ohlc.open
    }
}

/// Domain entity - bounded history of sealed candles.
///
/// Append-only from the back; once `max_size` is exceeded the oldest entry is
/// evicted from the front.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: VecDeque<Candle>,
    max_size: usize,
}

impl CandleSeries {
    pub fn new(max_size: usize) -> Self {
        Self { candles: VecDeque::with_capacity(max_size.min(1024)), max_size }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        while self.candles.len() > self.max_size {
            self.candles.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Candle> + ExactSizeIterator {
        self.candles.iter()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn count(&self) -> usize {
        self.candles.len()
    }

    pub fn to_vec(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }
}

use super::price_function::DeterministicPrice;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Candle, CandleSeries, Ohlc, Price, Timestamp};
use crate::log_debug;

/// Fraction of `|open - close|` added above the max and below the min of a
/// synthesized history candle.
const SEED_WICK_RATIO: f64 = 0.2;

/// Buckets the live price stream into grid-aligned OHLC candles.
///
/// Holds the bounded sealed history plus exactly one in-progress candle.
/// Catch-up after a long pause seals one candle per [`advance`] call; each
/// following call re-checks the boundary, so sealed start times stay gapless.
///
/// [`advance`]: CandleAggregator::advance
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    duration_ms: u64,
    history: CandleSeries,
    current: Candle,
    last_seen: u64,
}

impl CandleAggregator {
    pub fn new(duration_ms: u64, history_cap: usize, now_ms: u64, price: Price) -> Self {
        Self {
            duration_ms,
            history: CandleSeries::new(history_cap),
            current: Candle::flat(Timestamp::from_millis(now_ms).floor_to(duration_ms), price),
            last_seen: now_ms,
        }
    }

    pub fn history(&self) -> &CandleSeries {
        &self.history
    }

    pub fn current(&self) -> &Candle {
        &self.current
    }

    /// Regenerate the sealed history from the deterministic price alone.
    ///
    /// Fills the `lookback` grid windows that end at the bucket containing
    /// `now`. Returns the close of the newest synthesized candle.
    pub fn seed_history(&mut self, prices: &DeterministicPrice, now_ms: u64, lookback: usize) -> Option<Price> {
        let d = self.duration_ms;
        let grid = Timestamp::from_millis(now_ms).floor_to(d).value();

        self.history.clear();
        for i in (1..=lookback as u64).rev() {
            let Some(start) = i.checked_mul(d).and_then(|span| grid.checked_sub(span)) else {
                continue;
            };
            self.history.push(synthesize_candle(prices, start, d));
        }

        log_debug!(
            LogComponent::Simulation("Aggregator"),
            "seeded {} candles ending at {}",
            self.history.count(),
            grid
        );

        self.history.latest().map(|c| c.ohlc.close)
    }

    /// Open a fresh in-progress candle at the grid boundary at or before `now`.
    ///
    /// Never opens before the end of the newest sealed candle. Once `now` is
    /// past the in-progress window that candle is sealed instead of dropped,
    /// and the next one opens at its end, exactly as [`advance`] would.
    ///
    /// [`advance`]: CandleAggregator::advance
    pub fn align_current(&mut self, now_ms: u64, price: Price) -> Option<Candle> {
        self.last_seen = self.last_seen.max(now_ms);

        let end = self.current.end_time(self.duration_ms);
        if now_ms >= end.value() {
            let sealed = self.current;
            self.history.push(sealed);
            self.current = Candle::flat(end, price);
            return Some(sealed);
        }

        let mut start = Timestamp::from_millis(now_ms).floor_to(self.duration_ms);
        if let Some(last) = self.history.latest() {
            start = start.max(last.end_time(self.duration_ms));
        }
        self.current = Candle::flat(start, price);
        None
    }

    /// Feed the latest live price into the in-progress candle.
    pub fn record(&mut self, price: Price) {
        self.current.record(price);
    }

    /// Seal the in-progress candle once `now` crosses its end.
    ///
    /// The next candle opens at `previous_start + duration`, not at the grid
    /// bucket of `now`. A `now` earlier than one already observed is ignored.
    pub fn advance(&mut self, now_ms: u64, price: Price) -> Option<Candle> {
        if now_ms < self.last_seen {
            log_debug!(
                LogComponent::Simulation("Aggregator"),
                "clock moved back from {} to {}, skipping",
                self.last_seen,
                now_ms
            );
            return None;
        }
        self.last_seen = now_ms;

        let end = self.current.end_time(self.duration_ms);
        if now_ms < end.value() {
            return None;
        }

        let sealed = self.current;
        self.history.push(sealed);
        self.current = Candle::flat(end, price);
        Some(sealed)
    }
}

/// OHLC for one past window from samples at its start, middle and end.
fn synthesize_candle(prices: &DeterministicPrice, start: u64, duration_ms: u64) -> Candle {
    let open = prices.price_at(start);
    let close = prices.price_at(start + duration_ms);
    let mid = prices.price_at(start + duration_ms / 2);

    let wick = (open - close).abs() * SEED_WICK_RATIO;
    let high = open.max(close).max(mid) + wick;
    let low = open.min(close).min(mid) - wick;

    Candle::new(
        Timestamp::from_millis(start),
        Ohlc::new(Price::from(open), Price::from(high), Price::from(low), Price::from(close)),
    )
}

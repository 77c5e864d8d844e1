use super::aggregator::CandleAggregator;
use super::config::EngineConfig;
use super::physics::MomentumModel;
use super::price_function::DeterministicPrice;
use crate::domain::control::ControlUpdate;
use crate::domain::errors::ValidationResult;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Candle, CandleSeries, Price, Signal, Volatility};
use crate::{log_debug, log_info};

/// The simulated market: deterministic price, momentum model and candle
/// aggregation behind one owner.
///
/// All mutation happens synchronously inside [`tick`]/[`advance`]. Bias and
/// volatility setters only store the latest value; it is read on the next tick.
///
/// [`tick`]: ChartEngine::tick
/// [`advance`]: ChartEngine::advance
#[derive(Debug, Clone)]
pub struct ChartEngine {
    prices: DeterministicPrice,
    model: MomentumModel,
    aggregator: CandleAggregator,
    price: f64,
    signal: Signal,
    volatility: Volatility,
    last_tick: u64,
}

impl ChartEngine {
    /// Seed history up to `now_ms` and open the in-progress candle on the grid.
    /// Fails if `config` does not validate.
    pub fn new(config: EngineConfig, now_ms: u64) -> ValidationResult<Self> {
        config.validate()?;
        let prices = DeterministicPrice::new(config.base_price);
        let opening = Price::from(prices.price_at(now_ms));
        let mut aggregator = CandleAggregator::new(config.candle_duration_ms, config.history_cap, now_ms, opening);

        let price = aggregator.seed_history(&prices, now_ms, config.lookback).unwrap_or(opening);
        aggregator.align_current(now_ms, price);

        log_info!(
            LogComponent::Simulation("Engine"),
            "engine ready: {} sealed candles, price {:.2}, candle {}ms",
            aggregator.history().count(),
            price.value(),
            config.candle_duration_ms
        );

        Ok(Self {
            model: MomentumModel::new(config.physics),
            prices,
            aggregator,
            price: price.value(),
            signal: Signal::Neutral,
            volatility: Volatility::default(),
            last_tick: now_ms,
        })
    }

    /// One physics step toward the deterministic price at `now_ms`, then widen
    /// the in-progress candle with the new live price.
    ///
    /// A `now_ms` earlier than the previous tick is treated as no time passing.
    pub fn tick(&mut self, now_ms: u64) {
        let now = now_ms.max(self.last_tick);
        self.last_tick = now;

        let target = self.prices.price_at(now);
        self.price = self.model.step(self.price, target, self.signal, self.volatility);
        self.aggregator.record(Price::from(self.price));
    }

    /// Seal the in-progress candle if its window has closed.
    pub fn advance(&mut self, now_ms: u64) -> Option<Candle> {
        let sealed = self.aggregator.advance(now_ms, Price::from(self.price));
        if let Some(candle) = &sealed {
            log_debug!(
                LogComponent::Simulation("Engine"),
                "sealed candle {} close {:.2}",
                candle.timestamp.value(),
                candle.ohlc.close.value()
            );
        }
        sealed
    }

    /// `tick` followed by `advance`, the per-frame sequence.
    pub fn step(&mut self, now_ms: u64) -> Option<Candle> {
        self.tick(now_ms);
        self.advance(now_ms)
    }

    /// Re-open the in-progress candle on the grid at `now_ms` with the live
    /// price. A window that has already closed is sealed, not dropped.
    pub fn align_current_candle(&mut self, now_ms: u64) -> Option<Candle> {
        let sealed = self.aggregator.align_current(now_ms, Price::from(self.price));
        log_debug!(
            LogComponent::Simulation("Engine"),
            "realigned at {}, current candle {}",
            now_ms,
            self.aggregator.current().timestamp.value()
        );
        sealed
    }

    pub fn set_bias(&mut self, signal: Signal) {
        if signal != self.signal {
            log_info!(LogComponent::Simulation("Engine"), "bias {} -> {}", self.signal, signal);
        }
        self.signal = signal;
    }

    /// Literal form used by the control channel. Unknown literals mean NEUTRAL.
    pub fn set_bias_literal(&mut self, literal: &str) {
        self.set_bias(Signal::parse_lenient(literal));
    }

    pub fn set_volatility(&mut self, multiplier: f64) {
        self.volatility = Volatility::new(multiplier);
    }

    pub fn apply_control(&mut self, update: ControlUpdate) {
        match update {
            ControlUpdate::Signal(signal) => self.set_bias(signal),
            ControlUpdate::Volatility(volatility) => self.volatility = volatility,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn momentum(&self) -> f64 {
        self.model.momentum()
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn volatility(&self) -> Volatility {
        self.volatility
    }

    pub fn current_candle(&self) -> &Candle {
        self.aggregator.current()
    }

    pub fn history(&self) -> &CandleSeries {
        self.aggregator.history()
    }

    /// Deterministic price at an arbitrary instant.
    pub fn price_at(&self, time_ms: u64) -> f64 {
        self.prices.price_at(time_ms)
    }
}

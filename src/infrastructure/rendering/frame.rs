//! Pure frame layout. Everything a surface needs to draw one frame, computed
//! without touching the browser so it can be checked natively.

use crate::domain::errors::{AppError, RenderingResult};
use crate::domain::market_data::{Candle, CandleSeries};
use crate::time_utils::{format_clock_label, format_price};
use crate::view_state::ViewState;

pub const BULL_COLOR: &str = "#00b894";
pub const BEAR_COLOR: &str = "#ff6b6b";
pub const GRID_COLUMNS: usize = 12;
pub const GRID_ROWS: usize = 8;
/// Body height, relative to the visible average, that marks a liquidity void.
pub const VOID_RATIO: f64 = 2.5;

/// Pointer position in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

/// Vertical price axis of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceScale {
    pub min: f64,
    pub max: f64,
    height: f64,
}

impl PriceScale {
    /// Fit the low/high of `candles`, with the range floored at `min_range`
    /// and padded by `padding_ratio` on both sides.
    pub fn fit<'a>(
        candles: impl IntoIterator<Item = &'a Candle>,
        height: f64,
        padding_ratio: f64,
        min_range: f64,
    ) -> Option<Self> {
        let (low, high) = candles.into_iter().fold(None, |acc: Option<(f64, f64)>, candle| {
            let (l, h) = (candle.ohlc.low.value(), candle.ohlc.high.value());
            Some(match acc {
                Some((low, high)) => (low.min(l), high.max(h)),
                None => (l, h),
            })
        })?;

        let range = (high - low).max(min_range);
        Some(Self {
            min: low - range * padding_ratio,
            max: high + range * padding_ratio,
            height,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn map_y(&self, price: f64) -> f64 {
        self.height - (price - self.min) / self.range() * self.height
    }

    pub fn price_at_y(&self, y: f64) -> f64 {
        self.min + self.range() * (1.0 - y / self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleGeometry {
    pub timestamp: u64,
    /// Left edge of the candle slot.
    pub x: f64,
    pub slot_width: f64,
    pub wick_x: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub body_x: f64,
    pub body_y: f64,
    pub body_width: f64,
    pub body_height: f64,
    pub bullish: bool,
    pub in_progress: bool,
}

impl CandleGeometry {
    pub fn color(&self) -> &'static str {
        if self.bullish { BULL_COLOR } else { BEAR_COLOR }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLine {
    pub y: f64,
    pub price: f64,
    pub label: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Crosshair {
    pub x: f64,
    pub y: f64,
    pub price_label: String,
    pub time_label: String,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub scale: PriceScale,
    pub vertical_grid: Vec<f64>,
    pub horizontal_grid: Vec<f64>,
    pub candles: Vec<CandleGeometry>,
    pub price_line: PriceLine,
    pub crosshair: Option<Crosshair>,
    /// Indices into `candles` whose bodies are unusually tall.
    pub liquidity_voids: Vec<usize>,
}

/// Engine state a frame is laid out from.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub history: &'a CandleSeries,
    pub current: &'a Candle,
    pub price: f64,
    pub now_ms: u64,
    pub pointer: Option<Pointer>,
}

pub struct FrameBuilder<'a> {
    view: &'a ViewState,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(view: &'a ViewState) -> Self {
        Self { view }
    }

    pub fn build(&self, input: FrameInput<'_>, width: u32, height: u32) -> RenderingResult<Frame> {
        if width == 0 || height == 0 {
            return Err(AppError::RenderingError(format!("surface has no area ({}x{})", width, height)));
        }
        let (w, h) = (width as f64, height as f64);

        let visible_count = self.view.visible_count();
        let skip = input.history.count().saturating_sub(visible_count);
        let visible: Vec<&Candle> = input.history.iter().skip(skip).chain(std::iter::once(input.current)).collect();

        let scale = PriceScale::fit(visible.iter().copied(), h, self.view.padding_ratio, self.view.min_price_range)
            .ok_or_else(|| AppError::RenderingError("nothing to draw".to_string()))?;

        let slot_width = w / (visible_count + 2) as f64;
        let last = visible.len() - 1;
        let candles: Vec<CandleGeometry> = visible
            .iter()
            .enumerate()
            .map(|(i, candle)| layout_candle(candle, i, slot_width, &scale, i == last))
            .collect();

        let price_line = PriceLine {
            y: scale.map_y(input.price),
            price: input.price,
            label: format_price(input.price),
            color: if input.price >= input.current.ohlc.open.value() { BULL_COLOR } else { BEAR_COLOR },
        };

        let crosshair = input
            .pointer
            .filter(|p| (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y))
            .map(|p| self.crosshair(p, w, input.now_ms, &scale));

        Ok(Frame {
            width: w,
            height: h,
            scale,
            vertical_grid: (0..GRID_COLUMNS).map(|i| w / GRID_COLUMNS as f64 * i as f64).collect(),
            horizontal_grid: (0..GRID_ROWS).map(|i| h / GRID_ROWS as f64 * i as f64).collect(),
            liquidity_voids: liquidity_voids(&candles),
            candles,
            price_line,
            crosshair,
        })
    }

    fn crosshair(&self, pointer: Pointer, width: f64, now_ms: u64, scale: &PriceScale) -> Crosshair {
        let window = self.view.crosshair_window_ms as f64;
        let at = now_ms as f64 - window / 2.0 + pointer.x / width * window;
        Crosshair {
            x: pointer.x,
            y: pointer.y,
            price_label: format_price(scale.price_at_y(pointer.y)),
            time_label: format_clock_label(at.max(0.0) as u64, self.view.utc_offset_minutes),
        }
    }
}

fn layout_candle(candle: &Candle, index: usize, slot_width: f64, scale: &PriceScale, in_progress: bool) -> CandleGeometry {
    let x = index as f64 * slot_width;
    let open_y = scale.map_y(candle.ohlc.open.value());
    let close_y = scale.map_y(candle.ohlc.close.value());

    CandleGeometry {
        timestamp: candle.timestamp.value(),
        x,
        slot_width,
        wick_x: x + slot_width / 2.0,
        high_y: scale.map_y(candle.ohlc.high.value()),
        low_y: scale.map_y(candle.ohlc.low.value()),
        body_x: x + 2.0,
        body_y: open_y.min(close_y),
        body_width: (slot_width - 4.0).max(1.0),
        body_height: (close_y - open_y).abs().max(1.0),
        bullish: candle.is_bullish(),
        in_progress,
    }
}

/// Candles whose body is taller than [`VOID_RATIO`] times the average body
/// height of `candles`. Purely an annotation; it never feeds the simulation.
pub fn liquidity_voids(candles: &[CandleGeometry]) -> Vec<usize> {
    if candles.is_empty() {
        return Vec::new();
    }
    let average = candles.iter().map(|c| c.body_height).sum::<f64>() / candles.len() as f64;
    if average <= 0.0 {
        return Vec::new();
    }
    candles
        .iter()
        .enumerate()
        .filter(|(_, c)| c.body_height > average * VOID_RATIO)
        .map(|(i, _)| i)
        .collect()
}

use serde::{Deserialize, Serialize};

/// View parameters controlling how much history is on screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewState {
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Candles visible at zoom 1.0.
    pub visible_base: f64,
    /// Fraction of the visible price range added above and below.
    pub padding_ratio: f64,
    /// Smallest price range the vertical scale will show.
    pub min_price_range: f64,
    /// Span of wall-clock time the crosshair maps across the surface width.
    pub crosshair_window_ms: u64,
    /// Offset from UTC used for clock labels.
    pub utc_offset_minutes: i32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.5,
            min_zoom: 0.5,
            max_zoom: 6.0,
            visible_base: 60.0,
            padding_ratio: 0.2,
            min_price_range: 1.0,
            crosshair_window_ms: 60_000,
            utc_offset_minutes: 0,
        }
    }
}

impl ViewState {
    /// Sealed candles shown next to the in-progress one.
    pub fn visible_count(&self) -> usize {
        ((self.visible_base / self.zoom).floor() as usize).max(1)
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
    }
}

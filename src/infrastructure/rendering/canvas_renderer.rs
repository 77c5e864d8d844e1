use std::f64::consts::TAU;

use js_sys::Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::FrameSink;
use super::frame::{CandleGeometry, Crosshair, Frame, PriceLine};
use crate::domain::errors::{AppError, RenderingResult};
use crate::domain::logging::LogComponent;
use crate::log_debug;

const GRID_COLOR: &str = "rgba(255, 255, 255, 0.1)";
const CROSSHAIR_COLOR: &str = "rgba(255, 255, 255, 0.5)";
const LABEL_BACKGROUND: &str = "#1e2330";
const LABEL_TEXT: &str = "#ffffff";
const VOID_OUTLINE: &str = "#ffd166";
const LABEL_FONT: &str = "11px JetBrains Mono";

fn js_error(action: &'static str) -> impl Fn(JsValue) -> AppError {
    move |err| AppError::RenderingError(format!("{} failed: {:?}", action, err))
}

/// Canvas 2D surface. The element is looked up lazily and cached; a missing
/// element is reported as an error on every frame until it appears.
pub struct CanvasRenderer {
    canvas_id: String,
    surface: Option<(HtmlCanvasElement, CanvasRenderingContext2d)>,
}

impl CanvasRenderer {
    pub fn new(canvas_id: impl Into<String>) -> Self {
        Self { canvas_id: canvas_id.into(), surface: None }
    }

    fn acquire(&mut self) -> RenderingResult<(HtmlCanvasElement, CanvasRenderingContext2d)> {
        if let Some((canvas, context)) = &self.surface {
            return Ok((canvas.clone(), context.clone()));
        }

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| AppError::RenderingError("document not available".to_string()))?;
        let canvas = document
            .get_element_by_id(&self.canvas_id)
            .ok_or_else(|| AppError::RenderingError(format!("canvas '{}' not found", self.canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| AppError::RenderingError(format!("'{}' is not a canvas", self.canvas_id)))?;
        let context = canvas
            .get_context("2d")
            .map_err(js_error("getContext"))?
            .ok_or_else(|| AppError::RenderingError("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| AppError::RenderingError("failed to cast to 2d context".to_string()))?;

        log_debug!(LogComponent::Rendering("Canvas"), "attached to #{}", self.canvas_id);
        self.surface = Some((canvas.clone(), context.clone()));
        Ok((canvas, context))
    }

    /// Match the canvas backing store to its parent's client size.
    pub fn resize_to_parent(&mut self) -> RenderingResult<(u32, u32)> {
        let (canvas, _) = self.acquire()?;
        if let Some(parent) = canvas.parent_element() {
            canvas.set_width(parent.client_width().max(0) as u32);
            canvas.set_height(parent.client_height().max(0) as u32);
        }
        Ok((canvas.width(), canvas.height()))
    }

    fn draw_grid(&self, ctx: &CanvasRenderingContext2d, frame: &Frame) {
        ctx.set_stroke_style_str(GRID_COLOR);
        ctx.set_line_width(1.0);
        for &x in &frame.vertical_grid {
            ctx.begin_path();
            ctx.move_to(x, 0.0);
            ctx.line_to(x, frame.height);
            ctx.stroke();
        }
        for &y in &frame.horizontal_grid {
            ctx.begin_path();
            ctx.move_to(0.0, y);
            ctx.line_to(frame.width, y);
            ctx.stroke();
        }
    }

    fn draw_candle(&self, ctx: &CanvasRenderingContext2d, candle: &CandleGeometry, void: bool) {
        ctx.set_fill_style_str(candle.color());
        ctx.set_stroke_style_str(candle.color());
        ctx.set_line_width(1.5);

        ctx.begin_path();
        ctx.move_to(candle.wick_x, candle.high_y);
        ctx.line_to(candle.wick_x, candle.low_y);
        ctx.stroke();

        ctx.fill_rect(candle.body_x, candle.body_y, candle.body_width, candle.body_height);

        if void {
            ctx.set_stroke_style_str(VOID_OUTLINE);
            ctx.set_line_width(1.0);
            ctx.stroke_rect(candle.body_x - 1.0, candle.body_y - 1.0, candle.body_width + 2.0, candle.body_height + 2.0);
        }
    }

    fn draw_price_line(&self, ctx: &CanvasRenderingContext2d, line: &PriceLine, width: f64) -> RenderingResult<()> {
        ctx.set_shadow_blur(10.0);
        ctx.set_shadow_color(line.color);
        ctx.set_fill_style_str(line.color);
        ctx.begin_path();
        ctx.arc(width - 5.0, line.y, 4.0, 0.0, TAU).map_err(js_error("arc"))?;
        ctx.fill();
        ctx.set_shadow_blur(0.0);

        ctx.set_stroke_style_str(line.color);
        ctx.set_line_width(1.0);
        set_dash(ctx, &[5.0, 5.0])?;
        ctx.begin_path();
        ctx.move_to(0.0, line.y);
        ctx.line_to(width, line.y);
        ctx.stroke();
        set_dash(ctx, &[])?;

        ctx.fill_rect(width - 80.0, line.y - 10.0, 70.0, 20.0);
        ctx.set_fill_style_str(LABEL_TEXT);
        ctx.set_font(LABEL_FONT);
        ctx.fill_text(&line.label, width - 72.0, line.y + 4.0).map_err(js_error("fillText"))
    }

    fn draw_crosshair(&self, ctx: &CanvasRenderingContext2d, crosshair: &Crosshair, frame: &Frame) -> RenderingResult<()> {
        let (w, h) = (frame.width, frame.height);
        ctx.set_stroke_style_str(CROSSHAIR_COLOR);
        ctx.set_line_width(1.0);
        set_dash(ctx, &[4.0, 4.0])?;
        ctx.begin_path();
        ctx.move_to(crosshair.x, 0.0);
        ctx.line_to(crosshair.x, h);
        ctx.stroke();
        ctx.begin_path();
        ctx.move_to(0.0, crosshair.y);
        ctx.line_to(w, crosshair.y);
        ctx.stroke();
        set_dash(ctx, &[])?;

        ctx.set_font(LABEL_FONT);
        ctx.set_fill_style_str(LABEL_BACKGROUND);
        ctx.fill_rect(w - 70.0, crosshair.y - 10.0, 70.0, 20.0);
        ctx.set_fill_style_str(LABEL_TEXT);
        ctx.fill_text(&crosshair.price_label, w - 60.0, crosshair.y + 4.0).map_err(js_error("fillText"))?;

        ctx.set_fill_style_str(LABEL_BACKGROUND);
        ctx.fill_rect(crosshair.x - 30.0, h - 20.0, 60.0, 20.0);
        ctx.set_fill_style_str(LABEL_TEXT);
        ctx.fill_text(&crosshair.time_label, crosshair.x - 25.0, h - 6.0).map_err(js_error("fillText"))
    }
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) -> RenderingResult<()> {
    let array = Array::new();
    for &segment in segments {
        array.push(&JsValue::from_f64(segment));
    }
    ctx.set_line_dash(&array).map_err(js_error("setLineDash"))
}

impl FrameSink for CanvasRenderer {
    fn surface_size(&mut self) -> RenderingResult<(u32, u32)> {
        let (canvas, _) = self.acquire()?;
        if canvas.width() == 0 || canvas.height() == 0 {
            return self.resize_to_parent();
        }
        Ok((canvas.width(), canvas.height()))
    }

    fn resize(&mut self) -> RenderingResult<()> {
        self.resize_to_parent().map(|_| ())
    }

    fn present(&mut self, frame: &Frame) -> RenderingResult<()> {
        let (_, ctx) = self.acquire()?;
        ctx.clear_rect(0.0, 0.0, frame.width, frame.height);

        self.draw_grid(&ctx, frame);
        for (i, candle) in frame.candles.iter().enumerate() {
            self.draw_candle(&ctx, candle, frame.liquidity_voids.contains(&i));
        }
        self.draw_price_line(&ctx, &frame.price_line, frame.width)?;
        if let Some(crosshair) = &frame.crosshair {
            self.draw_crosshair(&ctx, crosshair, frame)?;
        }
        Ok(())
    }
}

pub mod canvas_renderer;
pub mod frame;

pub use canvas_renderer::CanvasRenderer;
pub use frame::{Frame, FrameBuilder, FrameInput, Pointer, PriceScale, liquidity_voids};

use crate::domain::errors::RenderingResult;

/// Drawing surface the session hands finished frames to.
pub trait FrameSink {
    /// Current surface size in pixels. May resize the surface first.
    fn surface_size(&mut self) -> RenderingResult<(u32, u32)>;

    fn present(&mut self, frame: &Frame) -> RenderingResult<()>;

    /// Re-fit the surface to its container.
    fn resize(&mut self) -> RenderingResult<()> {
        Ok(())
    }
}

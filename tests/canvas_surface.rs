#![cfg(target_arch = "wasm32")]

use sim_chart_wasm::application::ChartSession;
use sim_chart_wasm::domain::simulation::{ChartEngine, EngineConfig};
use sim_chart_wasm::infrastructure::rendering::{CanvasRenderer, FrameSink};
use sim_chart_wasm::view_state::ViewState;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount_canvas(id: &str, width: u32, height: u32) -> web_sys::HtmlCanvasElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document.create_element("canvas").unwrap().dyn_into::<web_sys::HtmlCanvasElement>().unwrap();
    canvas.set_id(id);
    canvas.set_width(width);
    canvas.set_height(height);
    document.body().unwrap().append_child(&canvas).unwrap();
    canvas
}

#[wasm_bindgen_test]
fn draws_frames_on_a_mounted_canvas() {
    mount_canvas("sim-chart-test", 640, 320);
    let now = js_sys::Date::now() as u64;
    let mut session = ChartSession::new(ChartEngine::new(EngineConfig::default(), now).unwrap(), ViewState::default())
        .with_sink(Box::new(CanvasRenderer::new("sim-chart-test")));

    for i in 0..10 {
        session.on_frame(now + i * 16);
    }
    assert_eq!(session.consecutive_render_failures(), 0);
}

#[wasm_bindgen_test]
fn missing_canvas_is_an_error() {
    let mut renderer = CanvasRenderer::new("no-such-canvas");
    assert!(renderer.surface_size().is_err());
}

#[wasm_bindgen_test]
fn stopping_cancels_the_pending_frame() {
    mount_canvas("sim-chart-api-test", 320, 160);
    let mut api = sim_chart_wasm::SimChartApi::new("sim-chart-api-test".to_string(), None).unwrap();

    api.start().unwrap();
    api.stop();
    api.stop();
    api.start().unwrap();
    api.stop();
    assert!(api.price().is_finite());
}

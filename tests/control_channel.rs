use serde_json::json;
use sim_chart_wasm::application::ChartSession;
use sim_chart_wasm::domain::control::{SIGNAL_PATH, SPEED_PATH};
use sim_chart_wasm::domain::market_data::Signal;
use sim_chart_wasm::domain::simulation::{ChartEngine, EngineConfig};
use sim_chart_wasm::infrastructure::ControlChannel;
use sim_chart_wasm::view_state::ViewState;

const NOW: u64 = 1_700_000_000_000;

fn session() -> ChartSession {
    ChartSession::new(ChartEngine::new(EngineConfig::default(), NOW).unwrap(), ViewState::default())
}

#[test]
fn stored_state_reaches_a_late_subscriber() {
    let mut channel = ControlChannel::new();
    channel.set(SIGNAL_PATH, json!("DOWN"));
    channel.set(SPEED_PATH, json!("2.5"));

    let session = session();
    session.attach_bias_source(&mut channel);

    let engine = session.engine();
    assert_eq!(engine.borrow().signal(), Signal::Down);
    assert_eq!(engine.borrow().volatility().value(), 2.5);
}

#[test]
fn latest_write_wins() {
    let mut channel = ControlChannel::new();
    let session = session();
    session.attach_bias_source(&mut channel);
    let engine = session.engine();

    assert_eq!(engine.borrow().signal(), Signal::Neutral);
    channel.set(SIGNAL_PATH, json!("UP"));
    channel.set(SIGNAL_PATH, json!("DOWN"));
    channel.set(SIGNAL_PATH, json!("UP"));
    assert_eq!(engine.borrow().signal(), Signal::Up);

    channel.set(SIGNAL_PATH, json!("HOLD"));
    assert_eq!(engine.borrow().signal(), Signal::Neutral);

    channel.set(SPEED_PATH, json!(0));
    assert_eq!(engine.borrow().volatility().value(), 1.0);
}

#[test]
fn writes_between_frames_only_change_the_next_tick() {
    let mut channel = ControlChannel::new();
    let mut session = session();
    session.attach_bias_source(&mut channel);

    let before = session.engine().borrow().price();
    channel.set(SIGNAL_PATH, json!("UP"));
    assert_eq!(session.engine().borrow().price(), before);

    session.on_frame(NOW);
    assert!(session.engine().borrow().price() > before);
}

#[test]
fn dropped_session_stops_listening() {
    let mut channel = ControlChannel::new();
    let session = session();
    session.attach_bias_source(&mut channel);
    assert_eq!(channel.listener_count(), 2);
    drop(session);

    channel.set(SIGNAL_PATH, json!("UP"));
    assert_eq!(channel.get(SIGNAL_PATH), Some(&json!("UP")));
    assert_eq!(channel.listener_count(), 1);

    channel.set(SPEED_PATH, json!(2.0));
    assert_eq!(channel.listener_count(), 0);
}

//! Simulation aggregate: deterministic price, momentum model and candle
//! aggregation. Leaves first: price_function → physics → aggregator → engine.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod physics;
pub mod price_function;

pub use aggregator::CandleAggregator;
pub use config::{EngineConfig, PhysicsParams};
pub use engine::ChartEngine;
pub use physics::MomentumModel;
pub use price_function::DeterministicPrice;

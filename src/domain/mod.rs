pub mod control;
pub mod errors;
pub mod events;
pub mod logging;
pub mod market_data;
pub mod simulation;

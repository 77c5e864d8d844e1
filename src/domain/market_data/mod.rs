//! Market data aggregate: candles, the bounded sealed history and the value
//! objects shared by the simulation and the renderer.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;

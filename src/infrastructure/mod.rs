pub mod control_channel;
pub mod rendering;
pub mod services;

pub use control_channel::ControlChannel;

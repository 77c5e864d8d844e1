pub mod chart_service;
pub mod signal_automation;

pub use chart_service::ChartSession;
pub use signal_automation::SignalAutomation;

use derive_more::Display;

/// Error taxonomy of the chart engine. Nothing here is fatal: callers log and
/// carry on with the simulation.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum AppError {
    #[display(fmt = "Rendering Error: {}", _0)]
    RenderingError(String),
    #[display(fmt = "Validation Error: {}", _0)]
    ValidationError(String),
    #[display(fmt = "Schedule Error: {}", _0)]
    ScheduleError(String),
}

impl std::error::Error for AppError {}

pub type RenderingResult<T> = Result<T, AppError>;
pub type ValidationResult<T> = Result<T, AppError>;

impl From<AppError> for wasm_bindgen::JsValue {
    fn from(err: AppError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

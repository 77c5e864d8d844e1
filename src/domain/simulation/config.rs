use serde::{Deserialize, Serialize};

use crate::domain::errors::{AppError, ValidationResult};

/// Tuning constants of the momentum model.
///
/// These are free design parameters, not physical quantities. The names
/// describe what each constant does to the numbers and nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsParams {
    /// Fraction of the gap to the deterministic price added to momentum per
    /// tick while no bias is active.
    pub pull_factor: f64,
    /// Momentum retained per tick while no bias is active.
    pub momentum_decay: f64,
    /// Target momentum per tick under an `UP`/`DOWN` bias at volatility 1.0.
    pub bias_force: f64,
    /// Lerp fraction moving momentum toward the bias target per tick.
    pub bias_step: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self { pull_factor: 0.05, momentum_decay: 0.95, bias_force: 1.5, bias_step: 0.05 }
    }
}

/// Explicit engine context, passed to the constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub base_price: f64,
    pub candle_duration_ms: u64,
    /// Maximum number of sealed candles kept in history.
    pub history_cap: usize,
    /// Number of grid windows synthesized on start-up.
    pub lookback: usize,
    pub physics: PhysicsParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_price: 65_420.50,
            candle_duration_ms: 8_000,
            history_cap: 500,
            lookback: 200,
            physics: PhysicsParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AppError::ValidationError(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if !self.base_price.is_finite() {
            return Err(AppError::ValidationError("basePrice must be finite".to_string()));
        }
        if self.candle_duration_ms == 0 {
            return Err(AppError::ValidationError("candleDurationMs must be positive".to_string()));
        }
        if self.history_cap == 0 {
            return Err(AppError::ValidationError("historyCap must be positive".to_string()));
        }
        let p = &self.physics;
        let finite = [p.pull_factor, p.momentum_decay, p.bias_force, p.bias_step].iter().all(|v| v.is_finite());
        if !finite {
            return Err(AppError::ValidationError("physics parameters must be finite".to_string()));
        }
        Ok(())
    }
}

use super::config::PhysicsParams;
use crate::domain::market_data::{Signal, Volatility};

/// Per-tick velocity model for the live price.
///
/// Neutral: momentum bleeds off and the price is pulled back toward the
/// deterministic path. Biased: the pull is ignored and momentum eases toward
/// `bias_force * direction * volatility`.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumModel {
    params: PhysicsParams,
    momentum: f64,
}

impl MomentumModel {
    pub fn new(params: PhysicsParams) -> Self {
        Self { params, momentum: 0.0 }
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Advance one tick and return the new live price.
    pub fn step(&mut self, price: f64, target: f64, signal: Signal, volatility: Volatility) -> f64 {
        let drift = (target - price) * self.params.pull_factor;

        if signal.is_neutral() {
            self.momentum = self.momentum * self.params.momentum_decay + drift;
        } else {
            let force = self.params.bias_force * signal.direction() * volatility.value();
            self.momentum = lerp(self.momentum, force, self.params.bias_step);
        }

        price + self.momentum
    }
}

fn lerp(start: f64, end: f64, amount: f64) -> f64 {
    (1.0 - amount) * start + amount * end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_eases_toward_force() {
        let mut model = MomentumModel::new(PhysicsParams::default());
        let mut price = 100.0;
        for _ in 0..20 {
            price = model.step(price, 100.0, Signal::Up, Volatility::default());
        }
        let expected = 1.5 * (1.0 - 0.95f64.powi(20));
        assert!((model.momentum() - expected).abs() < 1e-9);
        assert!(price > 100.0);
    }

    #[test]
    fn volatility_scales_force() {
        let mut model = MomentumModel::new(PhysicsParams::default());
        for _ in 0..2_000 {
            model.step(0.0, 0.0, Signal::Down, Volatility::new(2.0));
        }
        assert!((model.momentum() + 3.0).abs() < 1e-6);
    }

    #[test]
    fn neutral_at_target_is_still() {
        let mut model = MomentumModel::new(PhysicsParams::default());
        let price = model.step(50.0, 50.0, Signal::Neutral, Volatility::default());
        assert_eq!(price, 50.0);
        assert_eq!(model.momentum(), 0.0);
    }
}

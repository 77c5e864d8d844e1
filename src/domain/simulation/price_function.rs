/// Shared "ground truth" market: a pure function of the millisecond
/// timestamp. Every observer evaluating the same instant gets the same value,
/// across restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicPrice {
    base_price: f64,
}

/// Multi-hour wave. Time scales divide `t` in seconds; the period is
/// `2π` times the scale.
const MACRO_TIME_SCALE_S: f64 = 3_600.0;
const MACRO_AMPLITUDE: f64 = 500.0;
/// Multi-minute wave.
const MICRO_TIME_SCALE_S: f64 = 300.0;
const MICRO_AMPLITUDE: f64 = 50.0;
/// Sub-minute noise: two sinusoids at different frequencies.
const NOISE_FREQ_A: f64 = 0.5;
const NOISE_FREQ_B: f64 = 0.2;
const NOISE_AMPLITUDE: f64 = 10.0;

impl DeterministicPrice {
    pub fn new(base_price: f64) -> Self {
        Self { base_price }
    }

    /// Largest possible distance of `price_at` from the base price.
    pub fn amplitude(&self) -> f64 {
        MACRO_AMPLITUDE + MICRO_AMPLITUDE + 2.0 * NOISE_AMPLITUDE
    }

    pub fn price_at(&self, time_ms: u64) -> f64 {
        let t = time_ms as f64 / 1_000.0;

        let macro_wave = (t / MACRO_TIME_SCALE_S).sin() * MACRO_AMPLITUDE;
        let micro_wave = (t / MICRO_TIME_SCALE_S).sin() * MICRO_AMPLITUDE;
        let noise = ((t * NOISE_FREQ_A).sin() + (t * NOISE_FREQ_B).cos()) * NOISE_AMPLITUDE;

        self.base_price + macro_wave + micro_wave + noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_instances_agree() {
        let a = DeterministicPrice::new(65_420.50);
        let b = DeterministicPrice::new(65_420.50);
        for t in [0u64, 1, 8_000, 1_700_000_000_000, 4_102_444_800_000] {
            assert_eq!(a.price_at(t).to_bits(), b.price_at(t).to_bits());
        }
    }

    #[test]
    fn adjacent_milliseconds_are_close() {
        let p = DeterministicPrice::new(100.0);
        let t = 1_700_000_000_000;
        assert!((p.price_at(t + 1) - p.price_at(t)).abs() < 0.05);
    }
}

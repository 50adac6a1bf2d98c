//! Simple Moving Average (SMA) of closes.
//!
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars[..self.period].iter().map(|b| b.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            sum += bars[i].close - bars[i - self.period].close;
            result[i] = sum / self.period as f64;
        }

        // A NaN anywhere in the window poisons the running sum; recompute those
        // windows directly so values recover once the NaN leaves the window.
        if bars.iter().any(|b| b.close.is_nan()) {
            for (i, slot) in result.iter_mut().enumerate().skip(self.period - 1) {
                let window = &bars[(i + 1 - self.period)..=i];
                *slot = if window.iter().any(|b| b.close.is_nan()) {
                    f64::NAN
                } else {
                    window.iter().map(|b| b.close).sum::<f64>() / self.period as f64
                };
            }
        }

        result
    }
}

//! Mean cross — buy when the close crosses from below to at-or-above its
//! `xd`-bar simple moving average.

use super::{SignalEvent, SignalSide, TimingFactor};
use crate::domain::{Bar, Series};

#[derive(Debug, Clone)]
pub struct MeanCross {
    pub xd: usize,
}

impl MeanCross {
    pub fn new(xd: usize) -> Self {
        Self { xd }
    }

    /// Mean close of the `xd` bars ending at `index` (inclusive).
    fn mean_at(&self, bars: &[Bar], index: usize) -> Option<f64> {
        if self.xd == 0 || index + 1 < self.xd {
            return None;
        }
        let window = &bars[index + 1 - self.xd..=index];
        let mean = window.iter().map(|b| b.close).sum::<f64>() / self.xd as f64;
        (!mean.is_nan()).then_some(mean)
    }
}

impl TimingFactor for MeanCross {
    fn name(&self) -> &str {
        "mean_cross"
    }

    fn side(&self) -> SignalSide {
        SignalSide::Buy
    }

    fn warmup_bars(&self) -> usize {
        self.xd
    }

    fn fit_day(&self, series: &Series, index: usize) -> Option<SignalEvent> {
        if index == 0 || index >= series.len() {
            return None;
        }
        let bars = &series.bars;
        let prev_mean = self.mean_at(bars, index - 1)?;
        let mean = self.mean_at(bars, index)?;
        let crossed = bars[index - 1].close < prev_mean && bars[index].close >= mean;
        crossed.then(|| SignalEvent::at(series, index, SignalSide::Buy, self.name()))
    }
}

//! Channel breakout — buy when the close exceeds the highest high of the
//! previous `xd` bars.

use super::{prior_window, SignalEvent, SignalSide, TimingFactor};
use crate::domain::Series;

#[derive(Debug, Clone)]
pub struct ChannelBreakout {
    pub xd: usize,
}

impl ChannelBreakout {
    pub fn new(xd: usize) -> Self {
        Self { xd }
    }
}

impl TimingFactor for ChannelBreakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn side(&self) -> SignalSide {
        SignalSide::Buy
    }

    fn warmup_bars(&self) -> usize {
        self.xd
    }

    fn fit_day(&self, series: &Series, index: usize) -> Option<SignalEvent> {
        let window = prior_window(&series.bars, index, self.xd)?;
        let upper = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let close = series.bars[index].close;
        if close.is_nan() || upper.is_nan() || close <= upper {
            return None;
        }
        Some(SignalEvent::at(series, index, SignalSide::Buy, self.name()))
    }
}

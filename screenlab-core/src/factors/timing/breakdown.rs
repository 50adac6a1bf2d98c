//! Channel breakdown — sell when the close drops below the lowest low of the
//! previous `xd` bars.

use super::{prior_window, SignalEvent, SignalSide, TimingFactor};
use crate::domain::Series;

#[derive(Debug, Clone)]
pub struct ChannelBreakdown {
    pub xd: usize,
}

impl ChannelBreakdown {
    pub fn new(xd: usize) -> Self {
        Self { xd }
    }
}

impl TimingFactor for ChannelBreakdown {
    fn name(&self) -> &str {
        "breakdown"
    }

    fn side(&self) -> SignalSide {
        SignalSide::Sell
    }

    fn warmup_bars(&self) -> usize {
        self.xd
    }

    fn fit_day(&self, series: &Series, index: usize) -> Option<SignalEvent> {
        let window = prior_window(&series.bars, index, self.xd)?;
        let lower = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let close = series.bars[index].close;
        if close.is_nan() || lower.is_nan() || close >= lower {
            return None;
        }
        Some(SignalEvent::at(series, index, SignalSide::Sell, self.name()))
    }
}

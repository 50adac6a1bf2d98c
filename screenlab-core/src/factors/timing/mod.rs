//! Timing factors — detect entry/exit events on one instrument's history.
//!
//! Timing factors are portfolio-agnostic: they see the bar history only. A
//! factor evaluated at `index` may read `bars[0..=index]` and nothing later.

pub mod breakdown;
pub mod breakout;
pub mod mean_cross;

pub use breakdown::ChannelBreakdown;
pub use breakout::ChannelBreakout;
pub use mean_cross::MeanCross;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Series, Symbol};

/// Which side of a trade a timing factor speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSide {
    Buy,
    Sell,
}

impl std::fmt::Display for SignalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSide::Buy => write!(f, "buy"),
            SignalSide::Sell => write!(f, "sell"),
        }
    }
}

/// An immutable market event emitted by a timing factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub bar_index: usize,
    pub side: SignalSide,
    /// Name of the factor that fired.
    pub factor: String,
    /// Close of the signal bar.
    pub price: f64,
}

impl SignalEvent {
    pub(crate) fn at(series: &Series, index: usize, side: SignalSide, factor: &str) -> Self {
        let bar = &series.bars[index];
        Self {
            symbol: series.symbol.clone(),
            date: bar.date,
            bar_index: index,
            side,
            factor: factor.to_string(),
            price: bar.close,
        }
    }
}

/// Trait for timing factors.
pub trait TimingFactor: Send + Sync {
    /// Human-readable name (e.g., "breakout").
    fn name(&self) -> &str;

    fn side(&self) -> SignalSide;

    /// Number of bars needed before this factor can fire.
    fn warmup_bars(&self) -> usize;

    /// Evaluate the factor on bar `index`; `Some` if it fires.
    fn fit_day(&self, series: &Series, index: usize) -> Option<SignalEvent>;
}

/// Bars strictly before `index` covering `period` bars, or `None` during warmup.
pub(crate) fn prior_window(bars: &[Bar], index: usize, period: usize) -> Option<&[Bar]> {
    if period == 0 || index < period || index >= bars.len() {
        return None;
    }
    Some(&bars[index - period..index])
}

#[cfg(test)]
pub(crate) fn channel_series(highs_lows_closes: &[(f64, f64, f64)]) -> Series {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = highs_lows_closes
        .iter()
        .enumerate()
        .map(|(i, &(high, low, close))| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect();
    Series::new("SPY", bars)
}

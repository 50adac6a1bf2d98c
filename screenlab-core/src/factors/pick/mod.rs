//! Pick factors — veto a candidate on its resolved price series.

pub mod grow;
pub mod mean_regime;
pub mod price_min_max;
pub mod regress_ang;
pub mod top_n_growth;

pub use grow::GrowPicker;
pub use mean_regime::MeanRegimePicker;
pub use price_min_max::PriceMinMaxPicker;
pub use regress_ang::RegressAngPicker;
pub use top_n_growth::TopNGrowthPicker;

use crate::data::{SeriesLookup, SeriesWindow};
use crate::domain::{Series, Symbol};

/// Default series granularity in bars (one trading year).
pub const DEFAULT_XD: usize = 252;

/// Trait for pick factors.
///
/// Implementations are constructed once per worker and may keep interior
/// counters, but must not share state across workers.
pub trait StockPicker: Send + Sync {
    /// Human-readable name (e.g., "regress_ang").
    fn name(&self) -> &str;

    /// Series window the worker resolves before calling `fit_pick`.
    fn window(&self) -> SeriesWindow;

    /// Accept (`true`) or veto (`false`) one candidate.
    ///
    /// `series` holds at most `window().xd` bars and at least `window().min_xd`.
    fn fit_pick(&self, series: &Series) -> bool;

    fn supports_pick(&self) -> bool {
        true
    }

    fn supports_first_choice(&self) -> bool {
        false
    }

    /// Narrow a whole candidate list. Must return a subsequence of
    /// `candidates` (order preserved). Identity by default.
    fn fit_first_choice(&self, _lookup: &SeriesLookup<'_>, candidates: Vec<Symbol>) -> Vec<Symbol> {
        candidates
    }
}

/// Inverts the per-candidate verdict of the wrapped factor.
pub struct Reversed {
    inner: Box<dyn StockPicker>,
    name: String,
}

impl Reversed {
    pub fn new(inner: Box<dyn StockPicker>) -> Self {
        let name = format!("{}_reversed", inner.name());
        Self { inner, name }
    }
}

impl StockPicker for Reversed {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> SeriesWindow {
        self.inner.window()
    }

    fn fit_pick(&self, series: &Series) -> bool {
        !self.inner.fit_pick(series)
    }

    fn supports_pick(&self) -> bool {
        self.inner.supports_pick()
    }
}

/// Read `xd` / `min_xd` window parameters; `min_xd` defaults to `xd / 2`.
pub(crate) fn window_from(xd: usize, min_xd: Option<usize>) -> SeriesWindow {
    SeriesWindow::new(xd, min_xd.unwrap_or(xd / 2))
}

#[cfg(test)]
pub(crate) fn series_from_closes(closes: &[f64]) -> Series {
    Series::new("TEST", crate::indicators::make_bars(closes))
}

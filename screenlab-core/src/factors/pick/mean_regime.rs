//! Mean regime picker — last close must sit at or above its `mean_xd` SMA.

use super::StockPicker;
use crate::data::SeriesWindow;
use crate::domain::Series;
use crate::indicators::{Indicator, Sma};

#[derive(Debug, Clone)]
pub struct MeanRegimePicker {
    pub mean_xd: usize,
    window: SeriesWindow,
    sma: Sma,
}

impl MeanRegimePicker {
    /// `mean_xd` must be at least 1 (checked by the factory).
    pub fn new(mean_xd: usize, window: SeriesWindow) -> Self {
        Self {
            mean_xd,
            window,
            sma: Sma::new(mean_xd),
        }
    }
}

impl StockPicker for MeanRegimePicker {
    fn name(&self) -> &str {
        "mean_regime"
    }

    fn window(&self) -> SeriesWindow {
        self.window
    }

    fn fit_pick(&self, series: &Series) -> bool {
        let means = self.sma.compute(&series.bars);
        let (Some(close), Some(&mean)) = (series.last_close(), means.last()) else {
            return false;
        };
        !mean.is_nan() && close >= mean
    }
}

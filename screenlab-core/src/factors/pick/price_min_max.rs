//! Price band picker — every close in the window must lie inside
//! `[threshold_price_min, threshold_price_max]`.

use super::StockPicker;
use crate::data::SeriesWindow;
use crate::domain::Series;

#[derive(Debug, Clone)]
pub struct PriceMinMaxPicker {
    pub threshold_price_min: f64,
    pub threshold_price_max: f64,
    window: SeriesWindow,
}

impl PriceMinMaxPicker {
    pub fn new(threshold_price_min: f64, threshold_price_max: f64, window: SeriesWindow) -> Self {
        Self {
            threshold_price_min,
            threshold_price_max,
            window,
        }
    }
}

impl StockPicker for PriceMinMaxPicker {
    fn name(&self) -> &str {
        "price_min_max"
    }

    fn window(&self) -> SeriesWindow {
        self.window
    }

    fn fit_pick(&self, series: &Series) -> bool {
        !series.is_empty()
            && series.bars.iter().all(|b| {
                b.close >= self.threshold_price_min && b.close <= self.threshold_price_max
            })
    }
}

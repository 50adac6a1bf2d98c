//! Growth picker — percent change over the last `grow_xd` bars must exceed
//! `grow_num`.

use super::StockPicker;
use crate::data::SeriesWindow;
use crate::domain::Series;
use crate::indicators::growth_pct;

#[derive(Debug, Clone)]
pub struct GrowPicker {
    pub grow_xd: usize,
    pub grow_num: f64,
    window: SeriesWindow,
}

impl GrowPicker {
    pub fn new(grow_xd: usize, grow_num: f64, window: SeriesWindow) -> Self {
        Self {
            grow_xd,
            grow_num,
            window,
        }
    }
}

impl StockPicker for GrowPicker {
    fn name(&self) -> &str {
        "grow"
    }

    fn window(&self) -> SeriesWindow {
        self.window
    }

    fn fit_pick(&self, series: &Series) -> bool {
        growth_pct(&series.closes(), self.grow_xd).is_some_and(|g| g > self.grow_num)
    }
}

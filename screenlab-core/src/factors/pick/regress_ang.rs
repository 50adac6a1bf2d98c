//! Regression-angle picker — keeps candidates whose trend line over the window
//! has an angle inside `[threshold_ang_min, threshold_ang_max]` degrees.

use super::StockPicker;
use crate::data::SeriesWindow;
use crate::domain::Series;
use crate::indicators::regress_angle;

#[derive(Debug, Clone)]
pub struct RegressAngPicker {
    pub threshold_ang_min: f64,
    pub threshold_ang_max: f64,
    window: SeriesWindow,
}

impl RegressAngPicker {
    pub fn new(threshold_ang_min: f64, threshold_ang_max: f64, window: SeriesWindow) -> Self {
        Self {
            threshold_ang_min,
            threshold_ang_max,
            window,
        }
    }
}

impl StockPicker for RegressAngPicker {
    fn name(&self) -> &str {
        "regress_ang"
    }

    fn window(&self) -> SeriesWindow {
        self.window
    }

    fn fit_pick(&self, series: &Series) -> bool {
        match regress_angle(&series.closes()) {
            Some(ang) => ang >= self.threshold_ang_min && ang <= self.threshold_ang_max,
            None => false,
        }
    }
}

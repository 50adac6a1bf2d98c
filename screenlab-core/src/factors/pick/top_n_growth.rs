//! Top-N growth — batch-only picker keeping the `n` strongest growers over the
//! window, in their original order.

use tracing::debug;

use super::StockPicker;
use crate::data::{SeriesLookup, SeriesWindow};
use crate::domain::{Series, Symbol};
use crate::indicators::growth_pct;

#[derive(Debug, Clone)]
pub struct TopNGrowthPicker {
    pub n: usize,
    window: SeriesWindow,
}

impl TopNGrowthPicker {
    pub fn new(n: usize, window: SeriesWindow) -> Self {
        Self { n, window }
    }
}

impl StockPicker for TopNGrowthPicker {
    fn name(&self) -> &str {
        "top_n_growth"
    }

    fn window(&self) -> SeriesWindow {
        self.window
    }

    fn fit_pick(&self, _series: &Series) -> bool {
        true
    }

    fn supports_pick(&self) -> bool {
        false
    }

    fn supports_first_choice(&self) -> bool {
        true
    }

    fn fit_first_choice(&self, lookup: &SeriesLookup<'_>, candidates: Vec<Symbol>) -> Vec<Symbol> {
        let mut scored: Vec<(usize, f64)> = Vec::with_capacity(candidates.len());
        for (pos, symbol) in candidates.iter().enumerate() {
            let series = match lookup.window(symbol, self.window) {
                Ok(series) => series,
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "top_n_growth: no series");
                    continue;
                }
            };
            if let Some(g) = growth_pct(&series.closes(), series.len().saturating_sub(1)) {
                scored.push((pos, g));
            }
        }

        // Stable: equal growth keeps the earlier candidate.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.n);
        let mut keep: Vec<usize> = scored.into_iter().map(|(pos, _)| pos).collect();
        keep.sort_unstable();

        keep.into_iter().map(|pos| candidates[pos].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryProvider;
    use crate::env::{EnvSettings, EnvSnapshot};
    use crate::indicators::make_bars;

    #[test]
    fn keeps_strongest_growers_in_input_order() {
        let provider = InMemoryProvider::new()
            .with_series("A", make_bars(&[10.0, 11.0]))
            .with_series("B", make_bars(&[10.0, 20.0]))
            .with_series("C", make_bars(&[10.0, 9.0]))
            .with_series("D", make_bars(&[10.0, 15.0]));
        let env = EnvSnapshot::new(EnvSettings::default());
        let lookup = SeriesLookup::new(&provider, &env);
        let picker = TopNGrowthPicker::new(2, SeriesWindow::new(2, 2));

        let candidates: Vec<Symbol> = ["A", "B", "C", "D", "MISSING"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let kept = picker.fit_first_choice(&lookup, candidates);
        assert_eq!(kept, vec!["B".to_string(), "D".to_string()]);
    }
}

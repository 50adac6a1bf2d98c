//! Factor chains — the ordered factor lists a single worker owns for one pass.

use crate::data::SeriesWindow;

use super::factory::{FactorContext, FactorError, FactorRegistry};
use super::pick::StockPicker;
use super::request::FactorRequest;
use super::timing::{SignalSide, TimingFactor};

/// Batch chain plus per-candidate chain, both in request order.
pub struct FactorChain {
    pub first_choice: Vec<Box<dyn StockPicker>>,
    pub pickers: Vec<Box<dyn StockPicker>>,
}

impl FactorChain {
    /// Build both chains from one request list. Requests flagged
    /// `first_choice` go to the batch chain; everything else is per-candidate.
    /// Fails on the first malformed request.
    pub fn build(
        registry: &FactorRegistry,
        requests: &[FactorRequest],
        ctx: &FactorContext<'_>,
    ) -> Result<Self, FactorError> {
        let mut first_choice = Vec::new();
        let mut pickers = Vec::new();
        for (index, request) in requests.iter().enumerate() {
            let factor = registry.picker(index, request, ctx)?;
            if request.first_choice {
                first_choice.push(factor);
            } else {
                pickers.push(factor);
            }
        }
        Ok(Self {
            first_choice,
            pickers,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.first_choice.is_empty() && self.pickers.is_empty()
    }

    /// Distinct series windows the per-candidate chain needs, first-seen order.
    pub fn windows(&self) -> Vec<SeriesWindow> {
        let mut windows: Vec<SeriesWindow> = Vec::new();
        for picker in &self.pickers {
            let w = picker.window();
            if !windows.contains(&w) {
                windows.push(w);
            }
        }
        windows
    }
}

/// Buy-side and sell-side timing factors, in request order.
pub struct TimingChain {
    pub buy: Vec<Box<dyn TimingFactor>>,
    pub sell: Vec<Box<dyn TimingFactor>>,
}

impl TimingChain {
    pub fn build(
        registry: &FactorRegistry,
        buy: &[FactorRequest],
        sell: &[FactorRequest],
    ) -> Result<Self, FactorError> {
        let buy = buy
            .iter()
            .enumerate()
            .map(|(i, r)| registry.timing(i, r, SignalSide::Buy))
            .collect::<Result<Vec<_>, _>>()?;
        let sell = sell
            .iter()
            .enumerate()
            .map(|(i, r)| registry.timing(i, r, SignalSide::Sell))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { buy, sell })
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }

    /// Longest warmup across both sides.
    pub fn warmup_bars(&self) -> usize {
        self.buy
            .iter()
            .chain(self.sell.iter())
            .map(|f| f.warmup_bars())
            .max()
            .unwrap_or(0)
    }
}

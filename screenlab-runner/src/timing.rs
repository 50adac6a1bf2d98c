//! Timing worker — walks each candidate's full history through the buy and
//! sell timing chains and keeps candidates that produced any signal.

use screenlab_core::data::{SeriesLookup, SeriesProvider};
use screenlab_core::domain::{Series, Symbol};
use screenlab_core::env::EnvSnapshot;
use screenlab_core::factors::{
    FactorRegistry, FactorRequest, SignalEvent, TimingChain, TimingFactor,
};
use serde::Serialize;
use tracing::debug;

use crate::dispatch::{PartitionWorker, WorkerError};
use crate::merge::MergeOutput;
use crate::partition::Partition;
use crate::progress::ProgressTracker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingStats {
    pub evaluated: usize,
    pub with_signals: usize,
    pub data_rejections: usize,
}

/// Candidates with at least one signal, and every signal generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingOutput {
    pub symbols: Vec<Symbol>,
    pub signals: Vec<SignalEvent>,
    pub stats: TimingStats,
}

impl MergeOutput for TimingOutput {
    fn extend_from(&mut self, next: Self) {
        self.symbols.extend(next.symbols);
        self.signals.extend(next.signals);
        self.stats.evaluated += next.stats.evaluated;
        self.stats.with_signals += next.stats.with_signals;
        self.stats.data_rejections += next.stats.data_rejections;
    }
}

pub struct TimingWorker<'a> {
    pub registry: &'a FactorRegistry,
    pub buy: &'a [FactorRequest],
    pub sell: &'a [FactorRequest],
    pub provider: &'a dyn SeriesProvider,
    pub progress: &'a ProgressTracker,
}

/// First factor in `factors` that fires on bar `index`.
fn first_fire(
    factors: &[Box<dyn TimingFactor>],
    series: &Series,
    index: usize,
) -> Option<SignalEvent> {
    factors.iter().find_map(|f| f.fit_day(series, index))
}

/// Every signal for `series`, bar by bar, buy side before sell side.
pub fn scan_series(chain: &TimingChain, series: &Series) -> Vec<SignalEvent> {
    let mut signals = Vec::new();
    for index in 0..series.len() {
        if let Some(event) = first_fire(&chain.buy, series, index) {
            signals.push(event);
        }
        if let Some(event) = first_fire(&chain.sell, series, index) {
            signals.push(event);
        }
    }
    signals
}

impl PartitionWorker for TimingWorker<'_> {
    type Output = TimingOutput;

    fn run(&self, partition: &Partition, env: &EnvSnapshot) -> Result<TimingOutput, WorkerError> {
        let chain = TimingChain::build(self.registry, self.buy, self.sell)?;
        let lookup = SeriesLookup::new(self.provider, env);
        let min_len = chain.warmup_bars() + 1;
        let mut out = TimingOutput::default();

        for symbol in &partition.symbols {
            out.stats.evaluated += 1;
            let series = match lookup.full_history(symbol, min_len) {
                Ok(series) => series,
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "data rejection");
                    out.stats.data_rejections += 1;
                    self.progress.record_data_rejection();
                    continue;
                }
            };

            let signals = scan_series(&chain, &series);
            if signals.is_empty() {
                self.progress.record_veto();
                continue;
            }
            debug!(symbol = %symbol, signals = signals.len(), "signals generated");
            out.stats.with_signals += 1;
            self.progress.record_accepted();
            out.symbols.push(symbol.clone());
            out.signals.extend(signals);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenlab_core::data::InMemoryProvider;
    use screenlab_core::domain::Bar;
    use screenlab_core::factors::SignalSide;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1000,
            })
            .collect()
    }

    fn worker_run(symbols: &[&str], provider: &InMemoryProvider) -> TimingOutput {
        let registry = FactorRegistry::new();
        let buy = vec![FactorRequest::new("breakout").with_param("xd", 2.0)];
        let sell = vec![FactorRequest::new("breakdown").with_param("xd", 2.0)];
        let progress = ProgressTracker::new();
        let worker = TimingWorker {
            registry: &registry,
            buy: &buy,
            sell: &sell,
            provider,
            progress: &progress,
        };
        let partition = Partition {
            index: 0,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        };
        worker.run(&partition, &EnvSnapshot::default()).unwrap()
    }

    #[test]
    fn keeps_only_candidates_with_signals() {
        let provider = InMemoryProvider::new()
            .with_series("BREAKS", bars(&[10.0, 10.0, 12.0, 9.0]))
            .with_series("FLAT", bars(&[10.0, 10.0, 10.0, 10.0]))
            .with_series("TINY", bars(&[10.0]));

        let out = worker_run(&["BREAKS", "FLAT", "TINY"], &provider);
        assert_eq!(out.symbols, vec!["BREAKS"]);
        assert_eq!(out.stats.data_rejections, 1);

        let sides: Vec<(usize, SignalSide)> =
            out.signals.iter().map(|s| (s.bar_index, s.side)).collect();
        assert_eq!(sides, vec![(2, SignalSide::Buy), (3, SignalSide::Sell)]);
    }

    #[test]
    fn first_buy_factor_wins_the_bar() {
        let registry = FactorRegistry::new();
        let chain = TimingChain::build(
            &registry,
            &[
                FactorRequest::new("breakout").with_param("xd", 1.0),
                FactorRequest::new("mean_cross").with_param("xd", 2.0),
            ],
            &[],
        )
        .unwrap();
        // Both factors fire on bar 2.
        let series = Series::new("X", bars(&[10.0, 9.0, 11.0]));
        let signals = scan_series(&chain, &series);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].bar_index, 2);
        assert_eq!(signals[0].factor, "breakout");
    }
}

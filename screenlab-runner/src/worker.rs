//! Pick worker — the veto-chain evaluator for one partition.
//!
//! Stage 1 narrows the partition through the batch (first-choice) chain.
//! Stage 2 resolves each remaining candidate's series and runs the
//! per-candidate chain in order; the first veto ends that candidate's
//! evaluation.

use std::collections::BTreeMap;

use screenlab_core::data::{DataError, SeriesLookup, SeriesProvider, SeriesWindow};
use screenlab_core::domain::{Benchmark, Capital, Series, Symbol};
use screenlab_core::env::EnvSnapshot;
use screenlab_core::factors::{FactorChain, FactorContext, FactorRegistry, FactorRequest};
use serde::Serialize;
use tracing::debug;

use crate::dispatch::{PartitionWorker, WorkerError};
use crate::merge::MergeOutput;
use crate::partition::Partition;
use crate::progress::ProgressTracker;

/// Per-worker counters, summed across partitions by the merger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickStats {
    /// Candidates that reached the per-candidate stage.
    pub evaluated: usize,
    pub accepted: usize,
    /// Candidates dropped because their series could not be resolved.
    pub data_rejections: usize,
    /// Candidates removed by the batch chain.
    pub batch_dropped: usize,
    /// Veto count per factor name.
    pub vetoes: BTreeMap<String, usize>,
}

impl PickStats {
    pub fn total_vetoes(&self) -> usize {
        self.vetoes.values().sum()
    }

    pub fn absorb(&mut self, other: PickStats) {
        self.evaluated += other.evaluated;
        self.accepted += other.accepted;
        self.data_rejections += other.data_rejections;
        self.batch_dropped += other.batch_dropped;
        for (factor, n) in other.vetoes {
            *self.vetoes.entry(factor).or_insert(0) += n;
        }
    }
}

/// Surviving symbols of one partition plus its counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickOutput {
    pub symbols: Vec<Symbol>,
    pub stats: PickStats,
}

impl MergeOutput for PickOutput {
    fn extend_from(&mut self, next: Self) {
        self.symbols.extend(next.symbols);
        self.stats.absorb(next.stats);
    }
}

enum Verdict {
    Accepted,
    DataRejected(DataError),
    Vetoed(String),
}

/// Everything a pick worker needs besides its partition and snapshot.
///
/// Factor instances are rebuilt from `requests` on every `run`, so no
/// factor state is shared between partitions.
pub struct PickWorker<'a> {
    pub registry: &'a FactorRegistry,
    pub requests: &'a [FactorRequest],
    pub capital: &'a Capital,
    pub benchmark: &'a Benchmark,
    pub provider: &'a dyn SeriesProvider,
    pub progress: &'a ProgressTracker,
}

impl PickWorker<'_> {
    fn evaluate(
        &self,
        chain: &FactorChain,
        windows: &[SeriesWindow],
        lookup: &SeriesLookup<'_>,
        symbol: &str,
    ) -> Verdict {
        // Resolve every window up front: a data rejection never runs a factor.
        let mut resolved: Vec<(SeriesWindow, Series)> = Vec::with_capacity(windows.len());
        for &window in windows {
            match lookup.window(symbol, window) {
                Ok(series) => resolved.push((window, series)),
                Err(e) => return Verdict::DataRejected(e),
            }
        }

        for picker in &chain.pickers {
            let want = picker.window();
            let Some((_, series)) = resolved.iter().find(|(w, _)| *w == want) else {
                return Verdict::DataRejected(DataError::Parse(format!(
                    "no series resolved for window {want:?}"
                )));
            };
            if !picker.fit_pick(series) {
                return Verdict::Vetoed(picker.name().to_string());
            }
        }
        Verdict::Accepted
    }
}

impl PartitionWorker for PickWorker<'_> {
    type Output = PickOutput;

    fn run(&self, partition: &Partition, env: &EnvSnapshot) -> Result<PickOutput, WorkerError> {
        let ctx = FactorContext::new(self.capital, self.benchmark);
        let chain = FactorChain::build(self.registry, self.requests, &ctx)?;
        let lookup = SeriesLookup::new(self.provider, env);
        let mut stats = PickStats::default();

        let mut candidates = partition.symbols.clone();
        for factor in &chain.first_choice {
            let before = candidates.len();
            candidates = factor.fit_first_choice(&lookup, candidates);
            let dropped = before.saturating_sub(candidates.len());
            debug!(factor = factor.name(), before, dropped, "batch factor applied");
            stats.batch_dropped += dropped;
            self.progress.record_dropped(dropped);
        }

        if chain.pickers.is_empty() {
            stats.accepted = candidates.len();
            candidates.iter().for_each(|_| self.progress.record_accepted());
            return Ok(PickOutput {
                symbols: candidates,
                stats,
            });
        }

        let windows = chain.windows();
        let mut survivors = Vec::with_capacity(candidates.len());
        for symbol in candidates {
            stats.evaluated += 1;
            match self.evaluate(&chain, &windows, &lookup, &symbol) {
                Verdict::Accepted => {
                    stats.accepted += 1;
                    self.progress.record_accepted();
                    survivors.push(symbol);
                }
                Verdict::DataRejected(e) => {
                    debug!(symbol = %symbol, error = %e, "data rejection");
                    stats.data_rejections += 1;
                    self.progress.record_data_rejection();
                }
                Verdict::Vetoed(factor) => {
                    debug!(symbol = %symbol, factor = %factor, "vetoed");
                    *stats.vetoes.entry(factor).or_insert(0) += 1;
                    self.progress.record_veto();
                }
            }
        }

        debug!(
            partition = partition.index,
            evaluated = stats.evaluated,
            accepted = stats.accepted,
            "partition evaluated"
        );
        Ok(PickOutput {
            symbols: survivors,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenlab_core::data::InMemoryProvider;
    use screenlab_core::domain::Bar;
    use screenlab_core::factors::{FactorError, StockPicker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000,
            })
            .collect()
    }

    struct Never;

    impl StockPicker for Never {
        fn name(&self) -> &str {
            "never"
        }
        fn window(&self) -> SeriesWindow {
            SeriesWindow::new(5, 2)
        }
        fn fit_pick(&self, _series: &Series) -> bool {
            false
        }
    }

    struct Counting(Arc<AtomicUsize>);

    impl StockPicker for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn window(&self) -> SeriesWindow {
            SeriesWindow::new(5, 2)
        }
        fn fit_pick(&self, _series: &Series) -> bool {
            self.0.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_series("UP", bars(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .with_series("DOWN", bars(&[5.0, 4.0, 3.0, 2.0, 1.0]))
            .with_series("SHORT", bars(&[1.0]))
    }

    fn partition_of(symbols: &[&str]) -> Partition {
        Partition {
            index: 0,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn first_veto_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = FactorRegistry::new();
        registry.register_picker("never", |_, _| Ok(Box::new(Never)));
        let counter = Arc::clone(&calls);
        registry.register_picker("counting", move |_, _| {
            Ok(Box::new(Counting(Arc::clone(&counter))))
        });

        let requests = vec![FactorRequest::new("never"), FactorRequest::new("counting")];
        let provider = provider();
        let progress = ProgressTracker::new();
        let worker = PickWorker {
            registry: &registry,
            requests: &requests,
            capital: &Capital::default(),
            benchmark: &Benchmark::default(),
            provider: &provider,
            progress: &progress,
        };

        let out = worker
            .run(&partition_of(&["UP", "DOWN"]), &EnvSnapshot::default())
            .unwrap();
        assert!(out.symbols.is_empty());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(out.stats.vetoes.get("never"), Some(&2));
    }

    #[test]
    fn unresolvable_series_rejected_before_any_factor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = FactorRegistry::new();
        let counter = Arc::clone(&calls);
        registry.register_picker("counting", move |_, _| {
            Ok(Box::new(Counting(Arc::clone(&counter))))
        });

        let requests = vec![FactorRequest::new("counting")];
        let provider = provider();
        let progress = ProgressTracker::new();
        let worker = PickWorker {
            registry: &registry,
            requests: &requests,
            capital: &Capital::default(),
            benchmark: &Benchmark::default(),
            provider: &provider,
            progress: &progress,
        };

        let out = worker
            .run(
                &partition_of(&["UP", "SHORT", "MISSING"]),
                &EnvSnapshot::default(),
            )
            .unwrap();
        assert_eq!(out.symbols, vec!["UP"]);
        assert_eq!(out.stats.data_rejections, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(progress.snapshot().processed, 3);
    }

    #[test]
    fn empty_chain_passes_everything() {
        let registry = FactorRegistry::new();
        let provider = provider();
        let progress = ProgressTracker::new();
        let worker = PickWorker {
            registry: &registry,
            requests: &[],
            capital: &Capital::default(),
            benchmark: &Benchmark::default(),
            provider: &provider,
            progress: &progress,
        };

        let out = worker
            .run(&partition_of(&["UP", "MISSING"]), &EnvSnapshot::default())
            .unwrap();
        assert_eq!(out.symbols, vec!["UP", "MISSING"]);
    }

    #[test]
    fn builtin_chain_filters_downtrend() {
        let registry = FactorRegistry::new();
        let requests = vec![FactorRequest::new("mean_regime")
            .with_param("mean_xd", 3.0)
            .with_param("xd", 5.0)];
        let provider = provider();
        let progress = ProgressTracker::new();
        let worker = PickWorker {
            registry: &registry,
            requests: &requests,
            capital: &Capital::default(),
            benchmark: &Benchmark::default(),
            provider: &provider,
            progress: &progress,
        };

        let out = worker
            .run(&partition_of(&["DOWN", "UP"]), &EnvSnapshot::default())
            .unwrap();
        assert_eq!(out.symbols, vec!["UP"]);
        assert_eq!(out.stats.total_vetoes(), 1);
    }

    #[test]
    fn malformed_request_aborts_worker() {
        let registry = FactorRegistry::new();
        let requests = vec![FactorRequest::default()];
        let provider = provider();
        let progress = ProgressTracker::new();
        let worker = PickWorker {
            registry: &registry,
            requests: &requests,
            capital: &Capital::default(),
            benchmark: &Benchmark::default(),
            provider: &provider,
            progress: &progress,
        };

        let err = worker
            .run(&partition_of(&["UP"]), &EnvSnapshot::default())
            .unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Construction(FactorError::MissingFactorType { index: 0 })
        ));
        assert_eq!(progress.snapshot().processed, 0);
    }
}

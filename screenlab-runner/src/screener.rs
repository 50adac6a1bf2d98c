//! Screener — the caller-facing entry point for picking and timing.
//!
//! One call runs exactly one round of:
//! resolve candidates → guard worker count → partition → snapshot →
//! dispatch → merge → (pick only) split policy.

use screenlab_core::data::{DataError, SeriesProvider, UniverseSource};
use screenlab_core::domain::{dedup_symbols, Benchmark, Capital, Symbol};
use screenlab_core::env::{EnvSnapshot, SharedEnv};
use screenlab_core::factors::{
    FactorChain, FactorContext, FactorError, FactorRegistry, FactorRequest, SignalEvent,
    TimingChain,
};
use serde::Serialize;
use tracing::info;

use crate::dispatch::{dispatch, DispatchError, WorkerError};
use crate::guard::resolve_worker_count;
use crate::merge::merge;
use crate::partition::partition;
use crate::progress::ProgressTracker;
use crate::split::{apply_split_policy, AppliedSplit, SplitError, SplitPolicy, SplitStore};
use crate::timing::{TimingStats, TimingWorker};
use crate::worker::{PickStats, PickWorker};

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("factor construction failed: {0}")]
    Construction(#[from] FactorError),
    #[error(transparent)]
    Dispatch(DispatchError),
    #[error("candidate universe unavailable: {0}")]
    Universe(#[source] DataError),
    #[error("split policy failed: {0}")]
    Split(#[from] SplitError),
    #[error("timing needs at least one buy or sell factor")]
    EmptyTimingChain,
}

impl From<DispatchError> for SelectError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::WorkerFailed {
                source: WorkerError::Construction(e),
                ..
            } => SelectError::Construction(e),
            other => SelectError::Dispatch(other),
        }
    }
}

/// Inputs to [`Screener::select`].
#[derive(Debug, Clone, Default)]
pub struct SelectRequest {
    /// Explicit candidates; `None` or an empty list screens the whole universe.
    pub candidates: Option<Vec<Symbol>>,
    pub capital: Capital,
    pub benchmark: Benchmark,
    pub factors: Vec<FactorRequest>,
    /// 0 means the platform default.
    pub workers: usize,
    pub split: SplitPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub symbols: Vec<Symbol>,
    pub stats: PickStats,
    /// Effective worker count (number of partitions dispatched).
    pub workers: usize,
    pub split: AppliedSplit,
    pub env_fingerprint: String,
}

/// Inputs to [`Screener::time`].
#[derive(Debug, Clone, Default)]
pub struct TimingRequest {
    pub candidates: Option<Vec<Symbol>>,
    pub buy_factors: Vec<FactorRequest>,
    pub sell_factors: Vec<FactorRequest>,
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingResult {
    pub symbols: Vec<Symbol>,
    pub signals: Vec<SignalEvent>,
    pub stats: TimingStats,
    pub workers: usize,
    pub env_fingerprint: String,
}

/// Caller-supplied candidates. An empty list counts as no list, so the
/// universe is screened and the split policy applies.
fn explicit_candidates(candidates: &Option<Vec<Symbol>>) -> Option<&[Symbol]> {
    candidates.as_deref().filter(|symbols| !symbols.is_empty())
}

/// Binds the live environment to the data-side collaborators.
pub struct Screener<'a> {
    env: &'a SharedEnv,
    provider: &'a dyn SeriesProvider,
    universe: &'a dyn UniverseSource,
    splits: &'a dyn SplitStore,
    registry: FactorRegistry,
}

impl<'a> Screener<'a> {
    pub fn new(
        env: &'a SharedEnv,
        provider: &'a dyn SeriesProvider,
        universe: &'a dyn UniverseSource,
        splits: &'a dyn SplitStore,
    ) -> Self {
        Self {
            env,
            provider,
            universe,
            splits,
            registry: FactorRegistry::new(),
        }
    }

    /// Replace the factor registry (to add custom factor types).
    pub fn with_registry(mut self, registry: FactorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &FactorRegistry {
        &self.registry
    }

    fn candidates(
        &self,
        explicit: Option<&[Symbol]>,
        env: &EnvSnapshot,
    ) -> Result<Vec<Symbol>, SelectError> {
        let symbols = match explicit {
            Some(symbols) => symbols.to_vec(),
            None => self
                .universe
                .all_symbols(env.market_target())
                .map_err(SelectError::Universe)?,
        };
        Ok(dedup_symbols(symbols))
    }

    /// Screen candidates through the pick chain.
    ///
    /// All or nothing: a construction error or worker failure returns no
    /// partial selection.
    pub fn select(&self, request: &SelectRequest) -> Result<SelectionResult, SelectError> {
        self.select_with_progress(request, &ProgressTracker::new())
    }

    /// [`select`](Self::select), reporting into `progress` as candidates are
    /// evaluated. The tracker is reset at the start of the run; concurrent
    /// runs need their own trackers.
    pub fn select_with_progress(
        &self,
        request: &SelectRequest,
        progress: &ProgressTracker,
    ) -> Result<SelectionResult, SelectError> {
        let env = self.env.snapshot();

        // Malformed chains fail here, before any candidate is evaluated.
        let ctx = FactorContext::new(&request.capital, &request.benchmark);
        FactorChain::build(&self.registry, &request.factors, &ctx)?;

        let explicit = explicit_candidates(&request.candidates);
        let candidates = self.candidates(explicit, &env)?;
        let workers = resolve_worker_count(request.workers, env.store_mode());
        let partitions = partition(&candidates, workers);
        let effective = partitions.len();
        info!(
            candidates = candidates.len(),
            requested = request.workers,
            effective,
            "select started"
        );

        progress.reset(candidates.len());
        let worker = PickWorker {
            registry: &self.registry,
            requests: &request.factors,
            capital: &request.capital,
            benchmark: &request.benchmark,
            provider: self.provider,
            progress,
        };
        let merged = merge(dispatch(&worker, &partitions, &env, effective)?);

        let (symbols, split) = if explicit.is_some() {
            (merged.symbols, AppliedSplit::None)
        } else {
            apply_split_policy(merged.symbols, &request.split, self.splits, env.market_target())?
        };

        info!(selected = symbols.len(), split = ?split, "select finished");
        Ok(SelectionResult {
            symbols,
            stats: merged.stats,
            workers: effective,
            split,
            env_fingerprint: env.fingerprint().to_string(),
        })
    }

    /// Run the timing chains over candidates; keeps those with any signal.
    ///
    /// Both chains empty is an error: nothing could ever fire.
    pub fn time(&self, request: &TimingRequest) -> Result<TimingResult, SelectError> {
        self.time_with_progress(request, &ProgressTracker::new())
    }

    /// [`time`](Self::time), reporting into `progress`.
    pub fn time_with_progress(
        &self,
        request: &TimingRequest,
        progress: &ProgressTracker,
    ) -> Result<TimingResult, SelectError> {
        if request.buy_factors.is_empty() && request.sell_factors.is_empty() {
            return Err(SelectError::EmptyTimingChain);
        }
        let env = self.env.snapshot();
        TimingChain::build(&self.registry, &request.buy_factors, &request.sell_factors)?;

        let candidates = self.candidates(explicit_candidates(&request.candidates), &env)?;
        let workers = resolve_worker_count(request.workers, env.store_mode());
        let partitions = partition(&candidates, workers);
        let effective = partitions.len();
        info!(
            candidates = candidates.len(),
            requested = request.workers,
            effective,
            "timing started"
        );

        progress.reset(candidates.len());
        let worker = TimingWorker {
            registry: &self.registry,
            buy: &request.buy_factors,
            sell: &request.sell_factors,
            provider: self.provider,
            progress,
        };
        let merged = merge(dispatch(&worker, &partitions, &env, effective)?);

        info!(
            symbols = merged.symbols.len(),
            signals = merged.signals.len(),
            "timing finished"
        );
        Ok(TimingResult {
            symbols: merged.symbols,
            signals: merged.signals,
            stats: merged.stats,
            workers: effective,
            env_fingerprint: env.fingerprint().to_string(),
        })
    }
}

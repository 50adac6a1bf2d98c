//! Screenlab Runner — partitioned veto-filter dispatch.
//!
//! This crate builds on `screenlab-core` to provide:
//! - Partitioner and fallback guard (effective worker count)
//! - Generic dispatcher over a bounded rayon pool, serial when one worker
//! - Pick worker (batch chain + short-circuit per-candidate chain)
//! - Timing worker (buy/sell signal scan)
//! - Deterministic merge in partition order
//! - Post-selection train/test split with a JSON split store
//! - `Screener`, the caller-facing entry point, and TOML run configs

pub mod config;
pub mod dispatch;
pub mod guard;
pub mod merge;
pub mod partition;
pub mod progress;
pub mod screener;
pub mod split;
pub mod timing;
pub mod worker;

pub use config::{ConfigError, ScreenConfig, SelectSection};
pub use dispatch::{dispatch, DispatchError, PartitionResult, PartitionWorker, WorkerError};
pub use guard::{default_worker_count, resolve_worker_count};
pub use merge::{merge, MergeOutput};
pub use partition::{partition, Partition};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use screener::{
    Screener, SelectError, SelectRequest, SelectionResult, TimingRequest, TimingResult,
};
pub use split::{
    apply_split_policy, kfold, AppliedSplit, JsonSplitStore, SplitError, SplitKind, SplitPolicy,
    SplitStore,
};
pub use timing::{scan_series, TimingOutput, TimingStats, TimingWorker};
pub use worker::{PickOutput, PickStats, PickWorker};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<SelectionResult>();
        assert_sync::<SelectionResult>();
        assert_send::<TimingResult>();
        assert_sync::<TimingResult>();
        assert_send::<PartitionResult<PickOutput>>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<SelectError>();
        assert_sync::<SelectError>();
        assert_send::<DispatchError>();
        assert_sync::<DispatchError>();
    }

    #[test]
    fn workers_are_sync() {
        assert_sync::<PickWorker<'static>>();
        assert_sync::<TimingWorker<'static>>();
        assert_sync::<ProgressTracker>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScreenConfig>();
        assert_sync::<ScreenConfig>();
        assert_send::<SplitPolicy>();
        assert_sync::<SplitPolicy>();
        assert_send::<JsonSplitStore>();
        assert_sync::<JsonSplitStore>();
    }
}

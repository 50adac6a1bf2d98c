//! Dispatcher — runs one worker per partition, serially or on a bounded pool.
//!
//! The dispatcher knows nothing about picking or timing: anything that
//! implements [`PartitionWorker`] can be dispatched. Results come back tagged
//! with their partition index so the merge never depends on completion order.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;
use screenlab_core::env::{with_snapshot, EnvSnapshot};
use screenlab_core::factors::FactorError;
use tracing::{error, info};

use crate::partition::Partition;

/// Fatal errors raised inside a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("factor construction failed: {0}")]
    Construction(#[from] FactorError),
    #[error("worker for partition {partition} failed: {reason}")]
    Failed { partition: usize, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("partition {partition} failed")]
    WorkerFailed {
        partition: usize,
        #[source]
        source: WorkerError,
    },
    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),
}

/// Evaluates one partition.
///
/// `run` is called once per partition, possibly from several threads at
/// once, each call with its own snapshot.
pub trait PartitionWorker: Sync {
    type Output: Send;

    fn run(&self, partition: &Partition, env: &EnvSnapshot) -> Result<Self::Output, WorkerError>;
}

/// One worker's output, keyed by the partition it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult<T> {
    pub index: usize,
    pub output: T,
}

/// Run `worker` over every partition with `workers` threads.
///
/// `workers <= 1` runs on the caller's thread without building a pool. The
/// first failure fails the whole dispatch and every other result is dropped.
pub fn dispatch<W: PartitionWorker>(
    worker: &W,
    partitions: &[Partition],
    env: &EnvSnapshot,
    workers: usize,
) -> Result<Vec<PartitionResult<W::Output>>, DispatchError> {
    let started = Instant::now();
    info!(
        partitions = partitions.len(),
        workers,
        env = %env.fingerprint(),
        "dispatch started"
    );

    let results = if workers <= 1 {
        partitions
            .iter()
            .map(|p| run_one(worker, p, env.clone()))
            .collect::<Result<Vec<_>, _>>()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("screenlab-worker-{i}"))
            .build()
            .map_err(|e| DispatchError::PoolBuild(e.to_string()))?;
        pool.install(|| {
            partitions
                .par_iter()
                .map(|p| run_one(worker, p, env.clone()))
                .collect::<Result<Vec<_>, _>>()
        })
    };

    match &results {
        Ok(done) => info!(
            partitions = done.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatch finished"
        ),
        Err(e) => error!(error = %e, "dispatch aborted"),
    }
    results
}

/// Run one partition inside its own snapshot, turning panics into errors.
fn run_one<W: PartitionWorker>(
    worker: &W,
    partition: &Partition,
    snapshot: EnvSnapshot,
) -> Result<PartitionResult<W::Output>, DispatchError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        with_snapshot(&snapshot, partition.index, |env| worker.run(partition, env))
    }));

    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(WorkerError::Failed {
            partition: partition.index,
            reason: panic_message(payload.as_ref()),
        }),
    };

    match result {
        Ok(output) => Ok(PartitionResult {
            index: partition.index,
            output,
        }),
        Err(source) => {
            error!(partition = partition.index, error = %source, "worker failed");
            Err(DispatchError::WorkerFailed {
                partition: partition.index,
                source,
            })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

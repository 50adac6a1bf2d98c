//! Result merger — concatenates partition outputs in submission order.

use screenlab_core::domain::Symbol;
use tracing::info;

use crate::dispatch::PartitionResult;

/// A partition output that can be appended to another of the same kind.
pub trait MergeOutput: Default {
    fn extend_from(&mut self, next: Self);
}

impl MergeOutput for Vec<Symbol> {
    fn extend_from(&mut self, next: Self) {
        self.extend(next);
    }
}

/// Merge `results` strictly by partition index, regardless of the order they
/// arrive in. No deduplication: partitions never share a candidate.
pub fn merge<T: MergeOutput>(mut results: Vec<PartitionResult<T>>) -> T {
    results.sort_by_key(|r| r.index);
    let parts = results.len();
    let merged = results.into_iter().fold(T::default(), |mut acc, r| {
        acc.extend_from(r.output);
        acc
    });
    info!(partitions = parts, "results merged");
    merged
}

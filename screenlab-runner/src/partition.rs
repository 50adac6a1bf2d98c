//! Partitioner — splits the candidate universe into contiguous worker groups.

use screenlab_core::domain::Symbol;
use serde::Serialize;

use crate::guard::default_worker_count;

/// A contiguous, non-empty slice of the candidate universe owned by one
/// worker invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Submission position; the merger orders results by this.
    pub index: usize,
    pub symbols: Vec<Symbol>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Split `candidates` into at most `workers` contiguous groups whose sizes
/// differ by at most one; leading groups take the remainder.
///
/// `workers == 0` uses the platform default. Fewer candidates than workers
/// yields one singleton group per candidate; no candidates yields no groups.
/// The number of groups returned is the effective worker count.
pub fn partition(candidates: &[Symbol], workers: usize) -> Vec<Partition> {
    let workers = if workers == 0 {
        default_worker_count()
    } else {
        workers
    };
    let n = candidates.len();
    if n == 0 {
        return Vec::new();
    }

    let groups = workers.min(n);
    let base = n / groups;
    let remainder = n % groups;

    let mut partitions = Vec::with_capacity(groups);
    let mut start = 0;
    for index in 0..groups {
        let size = base + usize::from(index < remainder);
        partitions.push(Partition {
            index,
            symbols: candidates[start..start + size].to_vec(),
        });
        start += size;
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(n: usize) -> Vec<Symbol> {
        (1..=n).map(|i| format!("S{i}")).collect()
    }

    #[test]
    fn ten_over_three_is_four_three_three() {
        let parts = partition(&symbols(10), 3);
        let sizes: Vec<usize> = parts.iter().map(Partition::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(parts[0].symbols, vec!["S1", "S2", "S3", "S4"]);
        assert_eq!(parts[2].symbols, vec!["S8", "S9", "S10"]);
        assert_eq!(
            parts.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn more_workers_than_candidates_gives_singletons() {
        let parts = partition(&symbols(3), 8);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 1));
    }

    #[test]
    fn empty_universe_gives_no_partitions() {
        assert!(partition(&[], 4).is_empty());
    }

    #[test]
    fn zero_workers_uses_default() {
        let parts = partition(&symbols(1000), 0);
        assert_eq!(parts.len(), default_worker_count().min(1000));
    }

    #[test]
    fn single_worker_takes_everything() {
        let parts = partition(&symbols(7), 1);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 7);
    }
}

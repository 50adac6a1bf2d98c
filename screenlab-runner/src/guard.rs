//! Fallback guard — forces serial execution when the data store cannot take
//! concurrent workers.

use screenlab_core::env::StoreMode;
use tracing::info;

/// Worker count used when the caller asks for zero.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Effective worker count for `requested` under `store`.
///
/// An unsafe store with more than one requested worker is forced to 1; this
/// is a notice, not an error.
pub fn resolve_worker_count(requested: usize, store: StoreMode) -> usize {
    let requested = if requested == 0 {
        default_worker_count()
    } else {
        requested
    };
    if requested > 1 && !store.is_concurrency_safe() {
        info!(
            requested,
            effective = 1,
            fetch_mode = ?store.fetch_mode,
            cache_backend = ?store.cache_backend,
            "data store is not safe for concurrent workers; running serially"
        );
        return 1;
    }
    requested
}

//! Post-selection splitter — cached test/train lists or a fresh K-fold split.

use std::fmt;
use std::path::{Path, PathBuf};

use screenlab_core::domain::Symbol;
use screenlab_core::env::{EnvSnapshot, MarketTarget};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("no cached {kind} split for market {market}")]
    MissingCachedSplit { kind: SplitKind, market: MarketTarget },
    #[error("split store I/O at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("split file {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Train,
    Test,
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitKind::Train => write!(f, "train"),
            SplitKind::Test => write!(f, "test"),
        }
    }
}

/// Split flags. At most one applies, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitPolicy {
    pub use_cached_test: bool,
    pub use_cached_train: bool,
    pub enable_train_test_split: bool,
    pub n_folds: usize,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            use_cached_test: false,
            use_cached_train: false,
            enable_train_test_split: false,
            n_folds: 10,
        }
    }
}

/// Which split policy shaped a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedSplit {
    /// Splitter disabled or bypassed.
    #[default]
    None,
    CachedTest,
    CachedTrain,
    /// Fresh K-fold split; the training portion was kept.
    FreshTrain,
    /// Fresh split requested but too few candidates for the fold count.
    PassThrough,
}

/// Persisted train/test symbol lists, keyed by market.
pub trait SplitStore: Send + Sync {
    fn load(&self, market: MarketTarget, kind: SplitKind) -> Result<Vec<Symbol>, SplitError>;

    fn save(
        &self,
        market: MarketTarget,
        kind: SplitKind,
        symbols: &[Symbol],
    ) -> Result<(), SplitError>;
}

/// Split lists as JSON arrays at `<dir>/<market>_<kind>_symbols.json`.
#[derive(Debug, Clone)]
pub struct JsonSplitStore {
    dir: PathBuf,
}

impl JsonSplitStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self::new(env.settings().split_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, market: MarketTarget, kind: SplitKind) -> PathBuf {
        self.dir.join(format!("{market}_{kind}_symbols.json"))
    }
}

impl SplitStore for JsonSplitStore {
    fn load(&self, market: MarketTarget, kind: SplitKind) -> Result<Vec<Symbol>, SplitError> {
        let path = self.path(market, kind);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SplitError::MissingCachedSplit { kind, market });
            }
            Err(source) => return Err(SplitError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| SplitError::Serde { path, source })
    }

    fn save(
        &self,
        market: MarketTarget,
        kind: SplitKind,
        symbols: &[Symbol],
    ) -> Result<(), SplitError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SplitError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(market, kind);
        let json = serde_json::to_string_pretty(symbols).map_err(|source| SplitError::Serde {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| SplitError::Io { path, source })
    }
}

/// Contiguous K-fold split without shuffling; the last fold is the test set.
///
/// Fold sizes differ by at most one with leading folds taking the remainder.
/// Returns `None` when `n_folds < 2` or there are fewer symbols than folds.
pub fn kfold(symbols: &[Symbol], n_folds: usize) -> Option<(Vec<Symbol>, Vec<Symbol>)> {
    let n = symbols.len();
    if n_folds < 2 || n < n_folds {
        return None;
    }
    // Leading folds absorb the remainder, so the last fold is always n / k.
    let split_at = n - n / n_folds;
    Some((symbols[..split_at].to_vec(), symbols[split_at..].to_vec()))
}

/// Apply the highest-priority enabled policy to `selected`.
pub fn apply_split_policy(
    selected: Vec<Symbol>,
    policy: &SplitPolicy,
    store: &dyn SplitStore,
    market: MarketTarget,
) -> Result<(Vec<Symbol>, AppliedSplit), SplitError> {
    if policy.use_cached_test {
        let symbols = store.load(market, SplitKind::Test)?;
        info!(count = symbols.len(), "using cached test split");
        return Ok((symbols, AppliedSplit::CachedTest));
    }
    if policy.use_cached_train {
        let symbols = store.load(market, SplitKind::Train)?;
        info!(count = symbols.len(), "using cached train split");
        return Ok((symbols, AppliedSplit::CachedTrain));
    }
    if policy.enable_train_test_split {
        let Some((train, test)) = kfold(&selected, policy.n_folds) else {
            warn!(
                selected = selected.len(),
                n_folds = policy.n_folds,
                "too few candidates for train/test split; keeping selection"
            );
            return Ok((selected, AppliedSplit::PassThrough));
        };
        store.save(market, SplitKind::Train, &train)?;
        store.save(market, SplitKind::Test, &test)?;
        info!(
            train = train.len(),
            test = test.len(),
            n_folds = policy.n_folds,
            "fresh train/test split persisted"
        );
        return Ok((train, AppliedSplit::FreshTrain));
    }
    Ok((selected, AppliedSplit::None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(n: usize) -> Vec<Symbol> {
        (1..=n).map(|i| format!("S{i}")).collect()
    }

    #[test]
    fn kfold_last_fold_is_test() {
        let (train, test) = kfold(&symbols(10), 3).unwrap();
        // folds {4, 3, 3}
        assert_eq!(train.len(), 7);
        assert_eq!(test, vec!["S8", "S9", "S10"]);

        let (train, test) = kfold(&symbols(20), 10).unwrap();
        assert_eq!((train.len(), test.len()), (18, 2));
    }

    #[test]
    fn kfold_rejects_too_few() {
        assert!(kfold(&symbols(3), 10).is_none());
        assert!(kfold(&symbols(3), 1).is_none());
    }

    #[test]
    fn json_store_round_trip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSplitStore::new(dir.path().join("split"));

        assert!(matches!(
            store.load(MarketTarget::Us, SplitKind::Test),
            Err(SplitError::MissingCachedSplit { kind: SplitKind::Test, .. })
        ));

        store
            .save(MarketTarget::Us, SplitKind::Test, &symbols(2))
            .unwrap();
        assert_eq!(
            store.load(MarketTarget::Us, SplitKind::Test).unwrap(),
            vec!["S1", "S2"]
        );
        assert!(store
            .path(MarketTarget::Us, SplitKind::Test)
            .ends_with("us_test_symbols.json"));
    }

    #[test]
    fn cached_test_beats_fresh_split() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSplitStore::new(dir.path());
        store
            .save(MarketTarget::Us, SplitKind::Test, &["T1".to_string()])
            .unwrap();

        let policy = SplitPolicy {
            use_cached_test: true,
            enable_train_test_split: true,
            ..SplitPolicy::default()
        };
        let (out, applied) =
            apply_split_policy(symbols(30), &policy, &store, MarketTarget::Us).unwrap();
        assert_eq!(out, vec!["T1"]);
        assert_eq!(applied, AppliedSplit::CachedTest);
        assert!(!store.path(MarketTarget::Us, SplitKind::Train).exists());
    }

    #[test]
    fn fresh_split_persists_both_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSplitStore::new(dir.path());
        let policy = SplitPolicy {
            enable_train_test_split: true,
            n_folds: 5,
            ..SplitPolicy::default()
        };

        let (out, applied) =
            apply_split_policy(symbols(10), &policy, &store, MarketTarget::Cn).unwrap();
        assert_eq!(applied, AppliedSplit::FreshTrain);
        assert_eq!(out, symbols(8));
        assert_eq!(
            store.load(MarketTarget::Cn, SplitKind::Test).unwrap(),
            vec!["S9", "S10"]
        );
        assert_eq!(store.load(MarketTarget::Cn, SplitKind::Train).unwrap(), out);
    }

    #[test]
    fn no_flags_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSplitStore::new(dir.path());
        let (out, applied) =
            apply_split_policy(symbols(4), &SplitPolicy::default(), &store, MarketTarget::Us)
                .unwrap();
        assert_eq!(out, symbols(4));
        assert_eq!(applied, AppliedSplit::None);
    }
}

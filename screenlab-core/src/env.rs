//! Process environment — live settings and the immutable per-dispatch snapshot.
//!
//! `SharedEnv` is the process-wide, mutable configuration. Workers never read
//! it directly: the dispatcher captures an [`EnvSnapshot`] once per dispatch and
//! hands every worker its own deep copy, so a change to the live settings
//! mid-dispatch is never observed by a running worker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Market a screening run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTarget {
    Us,
    Cn,
    Hk,
    Coin,
    FuturesCn,
    FuturesGlobal,
    OptionsUs,
}

impl MarketTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Cn => "cn",
            Self::Hk => "hk",
            Self::Coin => "coin",
            Self::FuturesCn => "futures_cn",
            Self::FuturesGlobal => "futures_global",
            Self::OptionsUs => "options_us",
        }
    }
}

impl fmt::Display for MarketTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How historical series are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFetchMode {
    /// Local store first, network on a miss (writes back to the store).
    Normal,
    /// Always fetch from the network (writes back to the store).
    ForceNet,
    /// Local store only; never writes.
    ForceLocal,
}

/// Backend of the local historical-data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Single indexed file shared by every symbol. One writer system-wide.
    Hdf5,
    /// One file per symbol.
    Csv,
}

/// The parts of the environment that decide whether the data store tolerates
/// concurrent workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMode {
    pub fetch_mode: DataFetchMode,
    pub cache_backend: CacheBackend,
}

impl StoreMode {
    /// Read-only access is always safe; per-symbol files are safe because
    /// partitions never share a symbol. A shared indexed file that may be
    /// written back to is not.
    pub fn is_concurrency_safe(&self) -> bool {
        self.fetch_mode == DataFetchMode::ForceLocal || self.cache_backend == CacheBackend::Csv
    }
}

/// Errors loading environment settings.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("read env file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse env TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Every process-wide setting a worker may read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSettings {
    pub market_target: MarketTarget,
    pub fetch_mode: DataFetchMode,
    pub cache_backend: CacheBackend,
    /// Root of the local historical-data store.
    pub data_dir: PathBuf,
    /// Where persisted train/test split lists live.
    pub split_dir: PathBuf,
    pub locale: String,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            market_target: MarketTarget::Us,
            fetch_mode: DataFetchMode::Normal,
            cache_backend: CacheBackend::Hdf5,
            data_dir: PathBuf::from("data"),
            split_dir: PathBuf::from("data/split"),
            locale: "en_US".into(),
        }
    }
}

impl EnvSettings {
    pub fn from_file(path: &Path) -> Result<Self, EnvError> {
        let content = std::fs::read_to_string(path).map_err(|source| EnvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, EnvError> {
        Ok(toml::from_str(content)?)
    }

    pub fn store_mode(&self) -> StoreMode {
        StoreMode {
            fetch_mode: self.fetch_mode,
            cache_backend: self.cache_backend,
        }
    }
}

/// Live, mutable, process-wide settings.
///
/// Cloning a `SharedEnv` shares the same underlying settings; use
/// [`SharedEnv::snapshot`] to get an independent copy.
#[derive(Debug, Clone, Default)]
pub struct SharedEnv {
    inner: Arc<RwLock<EnvSettings>>,
}

impl SharedEnv {
    pub fn new(settings: EnvSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Capture the current settings into an immutable snapshot.
    pub fn snapshot(&self) -> EnvSnapshot {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        EnvSnapshot::new(guard.clone())
    }

    /// Mutate the live settings. Snapshots already taken are unaffected.
    pub fn update<F: FnOnce(&mut EnvSettings)>(&self, f: F) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

/// Immutable copy of [`EnvSettings`] captured at dispatch time.
///
/// `Clone` is a deep copy: each worker owns its snapshot outright.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSnapshot {
    settings: EnvSettings,
    fingerprint: String,
}

impl EnvSnapshot {
    pub fn new(settings: EnvSettings) -> Self {
        let hash = blake3::hash(format!("{settings:?}").as_bytes());
        let fingerprint = hash.to_hex()[..12].to_string();
        Self {
            settings,
            fingerprint,
        }
    }

    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    pub fn market_target(&self) -> MarketTarget {
        self.settings.market_target
    }

    pub fn fetch_mode(&self) -> DataFetchMode {
        self.settings.fetch_mode
    }

    pub fn store_mode(&self) -> StoreMode {
        self.settings.store_mode()
    }

    /// Short content hash identifying these settings in logs.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for EnvSnapshot {
    fn default() -> Self {
        Self::new(EnvSettings::default())
    }
}

/// Run `f` against `snapshot` inside a tracing span tagged with its fingerprint.
///
/// Everything a worker does happens inside this call; the snapshot is the only
/// environment it can see.
pub fn with_snapshot<T>(
    snapshot: &EnvSnapshot,
    partition: usize,
    f: impl FnOnce(&EnvSnapshot) -> T,
) -> T {
    let span = tracing::info_span!(
        "worker",
        partition,
        env = %snapshot.fingerprint(),
        market = %snapshot.market_target()
    );
    let _entered = span.enter();
    f(snapshot)
}

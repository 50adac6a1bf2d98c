//! Run configuration loaded from a TOML file.
//!
//! ```toml
//! [env]
//! market_target = "us"
//! fetch_mode = "force_local"
//! cache_backend = "csv"
//!
//! [select]
//! workers = 4
//!
//! [split]
//! enable_train_test_split = true
//! n_folds = 10
//!
//! [[pick_factors]]
//! factor_type = "regress_ang"
//! threshold_ang_min = 5.0
//! ```

use std::path::{Path, PathBuf};

use screenlab_core::domain::{Benchmark, Capital, Symbol};
use screenlab_core::env::EnvSettings;
use screenlab_core::factors::FactorRequest;
use serde::{Deserialize, Serialize};

use crate::screener::{SelectRequest, TimingRequest};
use crate::split::SplitPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[select]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectSection {
    /// Requested worker count; 0 means the platform default.
    pub workers: usize,
    /// Explicit candidates. When absent or empty the whole universe is
    /// screened and the splitter is eligible to run.
    pub symbols: Option<Vec<Symbol>>,
}

/// A complete screening run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub env: EnvSettings,
    pub select: SelectSection,
    pub split: SplitPolicy,
    pub capital: Capital,
    pub benchmark: Benchmark,
    pub pick_factors: Vec<FactorRequest>,
    pub buy_factors: Vec<FactorRequest>,
    pub sell_factors: Vec<FactorRequest>,
}

impl ScreenConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn select_request(&self) -> SelectRequest {
        SelectRequest {
            candidates: self.select.symbols.clone(),
            capital: self.capital.clone(),
            benchmark: self.benchmark.clone(),
            factors: self.pick_factors.clone(),
            workers: self.select.workers,
            split: self.split,
        }
    }

    pub fn timing_request(&self) -> TimingRequest {
        TimingRequest {
            candidates: self.select.symbols.clone(),
            buy_factors: self.buy_factors.clone(),
            sell_factors: self.sell_factors.clone(),
            workers: self.select.workers,
        }
    }
}

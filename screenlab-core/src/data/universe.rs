//! Universe configuration — sector-organized symbol lists.
//!
//! Stored as a TOML file with sectors and their member symbols. The resolved
//! universe is the concatenation of sectors in key order, each symbol kept
//! only at its first occurrence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::provider::{DataError, UniverseSource};
use crate::domain::{dedup_symbols, Symbol};
use crate::env::MarketTarget;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::Parse(format!("universe TOML: {e}")))
    }

    /// Every symbol across sectors, deduplicated in first-seen order.
    pub fn all_tickers(&self) -> Vec<Symbol> {
        dedup_symbols(self.sectors.values().flatten().cloned().collect())
    }

    pub fn ticker_count(&self) -> usize {
        self.all_tickers().len()
    }
}

impl UniverseSource for Universe {
    fn all_symbols(&self, _market: MarketTarget) -> Result<Vec<Symbol>, DataError> {
        Ok(self.all_tickers())
    }
}

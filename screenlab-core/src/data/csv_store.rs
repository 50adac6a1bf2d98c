//! CSV series store — one file per symbol under `<root>/<market>/<SYMBOL>.csv`.
//!
//! The store never fetches from the network, so `force_net` requests are
//! refused. `write` is for seeding the store, never called by a worker.

use std::path::{Path, PathBuf};

use super::provider::{DataError, SeriesProvider, SeriesRequest, UniverseSource};
use crate::domain::{Bar, Series, Symbol};
use crate::env::{DataFetchMode, EnvSnapshot, MarketTarget};

#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    root: PathBuf,
}

impl CsvSeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store rooted at the snapshot's `data_dir`.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self::new(env.settings().data_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn market_dir(&self, market: MarketTarget) -> PathBuf {
        self.root.join(market.as_str())
    }

    fn symbol_path(&self, market: MarketTarget, symbol: &str) -> PathBuf {
        self.market_dir(market).join(format!("{symbol}.csv"))
    }

    /// Write a symbol's bars, replacing any existing file.
    pub fn write(
        &self,
        market: MarketTarget,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<(), DataError> {
        let dir = self.market_dir(market);
        std::fs::create_dir_all(&dir).map_err(|source| DataError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = self.symbol_path(market, symbol);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| DataError::Parse(e.to_string()))?;
        for bar in bars {
            wtr.serialize(bar).map_err(|e| DataError::Parse(e.to_string()))?;
        }
        wtr.flush().map_err(|source| DataError::Io { path, source })?;
        Ok(())
    }

    /// Load every bar for a symbol, sorted by date. A void or inconsistent
    /// bar rejects the whole history.
    pub fn load(&self, market: MarketTarget, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.symbol_path(market, symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| DataError::Parse(e.to_string()))?;
        let mut bars = rdr
            .deserialize::<Bar>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;
        if let Some(bad) = bars.iter().find(|b| !b.is_sane()) {
            return Err(DataError::CorruptBar {
                symbol: symbol.to_string(),
                date: bad.date,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl SeriesProvider for CsvSeriesStore {
    fn name(&self) -> &str {
        "csv_store"
    }

    fn resolve(&self, symbol: &str, request: &SeriesRequest) -> Result<Series, DataError> {
        if request.fetch_mode == DataFetchMode::ForceNet {
            return Err(DataError::NetworkUnsupported {
                provider: self.name().to_string(),
            });
        }
        let bars = self.load(request.market, symbol)?;
        request.window(symbol, bars)
    }
}

impl UniverseSource for CsvSeriesStore {
    /// Every `*.csv` file stem in the market directory, sorted.
    fn all_symbols(&self, market: MarketTarget) -> Result<Vec<Symbol>, DataError> {
        let dir = self.market_dir(market);
        let entries = std::fs::read_dir(&dir).map_err(|source| DataError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut symbols: Vec<Symbol> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

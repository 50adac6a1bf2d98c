//! Series provider and universe source traits, plus structured data errors.
//!
//! Providers abstract over where history comes from (CSV store, synthetic,
//! in-memory) so workers can be tested without a real store.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{Bar, Series, Symbol};
use crate::env::{DataFetchMode, MarketTarget};

/// Structured error types for data operations.
///
/// Inside a worker every one of these is a data-availability rejection of a
/// single candidate, never a failure of the run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("insufficient data for {symbol}: {have} bars < minimum {need}")]
    InsufficientData {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("corrupt bar for {symbol} on {date}")]
    CorruptBar { symbol: String, date: NaiveDate },

    #[error("provider '{provider}' cannot fetch from the network")]
    NetworkUnsupported { provider: String },

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),
}

/// What a factor needs from a candidate's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub market: MarketTarget,
    pub fetch_mode: DataFetchMode,
    /// Number of most recent bars wanted; `None` for the full history.
    pub lookback: Option<usize>,
    /// Fewer bars than this makes the series unusable.
    pub min_len: usize,
}

impl SeriesRequest {
    /// Trim `bars` to the requested lookback and enforce the minimum length.
    pub fn window(&self, symbol: &str, bars: Vec<Bar>) -> Result<Series, DataError> {
        let series = Series::new(symbol, bars);
        let series = match self.lookback {
            Some(n) => series.tail(n),
            None => series,
        };
        if series.len() < self.min_len {
            return Err(DataError::InsufficientData {
                symbol: symbol.to_string(),
                have: series.len(),
                need: self.min_len,
            });
        }
        Ok(series)
    }
}

/// Resolves a candidate's price history.
///
/// Must be safe to call concurrently for reads whenever the fallback guard
/// has not forced serial execution.
pub trait SeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn resolve(&self, symbol: &str, request: &SeriesRequest) -> Result<Series, DataError>;
}

/// Supplies the full ordered candidate universe for a market.
///
/// Implementations return each symbol at most once.
pub trait UniverseSource: Send + Sync {
    fn all_symbols(&self, market: MarketTarget) -> Result<Vec<Symbol>, DataError>;
}

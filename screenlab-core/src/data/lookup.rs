//! Series lookup — binds a provider to the market and fetch mode a worker
//! observed in its environment snapshot.

use super::provider::{DataError, SeriesProvider, SeriesRequest};
use crate::domain::Series;
use crate::env::{DataFetchMode, EnvSnapshot, MarketTarget};

/// Series granularity a factor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesWindow {
    /// Number of most recent bars the factor looks at.
    pub xd: usize,
    /// Minimum usable length; shorter histories are rejected before the
    /// factor runs.
    pub min_xd: usize,
}

impl SeriesWindow {
    pub fn new(xd: usize, min_xd: usize) -> Self {
        Self { xd, min_xd }
    }
}

#[derive(Clone, Copy)]
pub struct SeriesLookup<'a> {
    provider: &'a dyn SeriesProvider,
    market: MarketTarget,
    fetch_mode: DataFetchMode,
}

impl<'a> SeriesLookup<'a> {
    pub fn new(provider: &'a dyn SeriesProvider, env: &EnvSnapshot) -> Self {
        Self {
            provider,
            market: env.market_target(),
            fetch_mode: env.fetch_mode(),
        }
    }

    /// The most recent `window.xd` bars, or an error if fewer than
    /// `window.min_xd` are available.
    pub fn window(&self, symbol: &str, window: SeriesWindow) -> Result<Series, DataError> {
        self.resolve(symbol, Some(window.xd), window.min_xd)
    }

    /// Full history, or an error if shorter than `min_len`.
    pub fn full_history(&self, symbol: &str, min_len: usize) -> Result<Series, DataError> {
        self.resolve(symbol, None, min_len)
    }

    fn resolve(
        &self,
        symbol: &str,
        lookback: Option<usize>,
        min_len: usize,
    ) -> Result<Series, DataError> {
        let request = SeriesRequest {
            market: self.market,
            fetch_mode: self.fetch_mode,
            lookback,
            min_len,
        };
        let series = self.provider.resolve(symbol, &request)?;
        // Providers are external; don't trust them to enforce the minimum.
        if series.len() < min_len {
            return Err(DataError::InsufficientData {
                symbol: symbol.to_string(),
                have: series.len(),
                need: min_len,
            });
        }
        Ok(series)
    }
}

//! In-memory provider for tests, benches and pre-loaded datasets.

use std::collections::HashMap;

use super::provider::{DataError, SeriesProvider, SeriesRequest, UniverseSource};
use crate::domain::{Bar, Series, Symbol};
use crate::env::MarketTarget;

/// Symbol → bars map that remembers insertion order for its universe.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    order: Vec<Symbol>,
    bars: HashMap<Symbol, Vec<Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a symbol's history.
    pub fn insert(&mut self, symbol: impl Into<Symbol>, bars: Vec<Bar>) {
        let symbol = symbol.into();
        if !self.bars.contains_key(&symbol) {
            self.order.push(symbol.clone());
        }
        self.bars.insert(symbol, bars);
    }

    pub fn with_series(mut self, symbol: impl Into<Symbol>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl SeriesProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn resolve(&self, symbol: &str, request: &SeriesRequest) -> Result<Series, DataError> {
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        request.window(symbol, bars.clone())
    }
}

impl UniverseSource for InMemoryProvider {
    fn all_symbols(&self, _market: MarketTarget) -> Result<Vec<Symbol>, DataError> {
        Ok(self.order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::DataFetchMode;
    use chrono::NaiveDate;

    fn bar(close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn universe_keeps_insertion_order_without_duplicates() {
        let mut p = InMemoryProvider::new();
        p.insert("B", vec![bar(1.0)]);
        p.insert("A", vec![bar(1.0)]);
        p.insert("B", vec![bar(2.0)]);
        assert_eq!(p.all_symbols(MarketTarget::Us).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn missing_symbol_is_not_found() {
        let p = InMemoryProvider::new();
        let request = SeriesRequest {
            market: MarketTarget::Us,
            fetch_mode: DataFetchMode::Normal,
            lookback: None,
            min_len: 0,
        };
        assert!(matches!(
            p.resolve("NOPE", &request),
            Err(DataError::SymbolNotFound { .. })
        ));
    }
}

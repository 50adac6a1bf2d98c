//! Series — a candidate's resolved price history.

use serde::{Deserialize, Serialize};

use super::{Bar, Symbol};

/// Resolved daily history for one symbol, oldest bar first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<Symbol>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// The most recent `n` bars (or all of them when shorter).
    pub fn tail(&self, n: usize) -> Series {
        let start = self.bars.len().saturating_sub(n);
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }
}

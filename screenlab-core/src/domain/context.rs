//! Capital and benchmark context handed to every worker and factor constructor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// Trading capital. Passed through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub initial_cash: f64,
}

impl Default for Capital {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
        }
    }
}

/// Benchmark instrument and the evaluation window it defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub symbol: Symbol,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            symbol: "SPY".into(),
            start: None,
            end: None,
        }
    }
}

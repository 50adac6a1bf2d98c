//! Synthetic provider — deterministic random-walk history per symbol.
//!
//! Developer/demo mode. Each symbol's walk is seeded from a BLAKE3 hash of its
//! name, so the same symbol always produces the same bars regardless of which
//! worker resolves it.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, SeriesProvider, SeriesRequest};
use crate::domain::{Bar, Series};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    history_len: usize,
    end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(history_len: usize, end: NaiveDate) -> Self {
        Self { history_len, end }
    }

    /// Date of the last generated bar.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Generate the full history for `symbol`, oldest bar first.
    pub fn generate(&self, symbol: &str) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let dates = business_days_ending(self.end, self.history_len);
        let drift: f64 = rng.gen_range(-0.001..0.001);
        let mut price = rng.gen_range(5.0..200.0_f64);

        dates
            .into_iter()
            .map(|date| {
                let daily_return: f64 = drift + rng.gen_range(-0.03..0.03);
                let open = price;
                let close = price * (1.0 + daily_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume = rng.gen_range(500_000..5_000_000u64);
                price = close;
                Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                }
            })
            .collect()
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(
            504,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        )
    }
}

impl SeriesProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn resolve(&self, symbol: &str, request: &SeriesRequest) -> Result<Series, DataError> {
        request.window(symbol, self.generate(symbol))
    }
}

/// The `n` weekdays ending at (and including, if a weekday) `end`, ascending.
fn business_days_ending(end: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut current = end;
    while dates.len() < n {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    dates.reverse();
    dates
}

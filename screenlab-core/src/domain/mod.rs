//! Domain types for screenlab.

pub mod bar;
pub mod context;
pub mod series;

pub use bar::Bar;
pub use context::{Benchmark, Capital};
pub use series::Series;

/// Symbol type alias. Candidate identity is the symbol string.
pub type Symbol = String;

/// Remove duplicate symbols, keeping the first occurrence of each.
pub fn dedup_symbols(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = std::collections::HashSet::with_capacity(symbols.len());
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let symbols = vec!["B".to_string(), "A".into(), "B".into(), "C".into(), "A".into()];
        assert_eq!(dedup_symbols(symbols), vec!["B", "A", "C"]);
    }
}

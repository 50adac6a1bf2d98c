//! Data collaborators: series providers and universe sources.

pub mod csv_store;
pub mod lookup;
pub mod memory;
pub mod provider;
pub mod synthetic;
pub mod universe;

pub use csv_store::CsvSeriesStore;
pub use lookup::{SeriesLookup, SeriesWindow};
pub use memory::InMemoryProvider;
pub use provider::{DataError, SeriesProvider, SeriesRequest, UniverseSource};
pub use synthetic::SyntheticProvider;
pub use universe::Universe;

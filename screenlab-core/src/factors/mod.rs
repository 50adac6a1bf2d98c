//! Factors — pluggable veto units for stock picking and signal timing.
//!
//! A factor is built from a [`FactorRequest`] through the [`FactorRegistry`]
//! and lives for a single worker pass. Pick factors ([`StockPicker`]) have two
//! capability modes:
//! - per-candidate: accept/reject one resolved series (`fit_pick`)
//! - batch ("first choice"): narrow a whole candidate list at once
//!
//! Timing factors ([`TimingFactor`]) walk one instrument's bars and emit
//! buy/sell [`SignalEvent`]s.

pub mod chain;
pub mod factory;
pub mod pick;
pub mod request;
pub mod timing;

pub use chain::{FactorChain, TimingChain};
pub use factory::{
    create_picker, create_timing, FactorContext, FactorError, FactorRegistry, PickerBuilder,
    TimingBuilder,
};
pub use pick::{Reversed, StockPicker};
pub use request::FactorRequest;
pub use timing::{SignalEvent, SignalSide, TimingFactor};

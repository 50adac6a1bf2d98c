//! Factor construction request — a factor type name plus named parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named-parameter record describing one factor.
///
/// In TOML:
/// ```toml
/// [[pick_factors]]
/// factor_type = "regress_ang"
/// threshold_ang_min = 5.0
/// xd = 120
/// ```
///
/// `factor_type` is mandatory; it is optional here only so that a request
/// missing it can be represented and rejected with a construction error.
/// Parameters use `BTreeMap` for deterministic ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_type: Option<String>,
    /// Route this factor to the batch (first-choice) chain.
    #[serde(default)]
    pub first_choice: bool,
    /// Invert the per-candidate verdict.
    #[serde(default)]
    pub reversed: bool,
    #[serde(flatten)]
    pub params: BTreeMap<String, f64>,
}

impl FactorRequest {
    pub fn new(factor_type: impl Into<String>) -> Self {
        Self {
            factor_type: Some(factor_type.into()),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn as_first_choice(mut self) -> Self {
        self.first_choice = true;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Display label, e.g. `regress_ang` or `<untyped>`.
    pub fn label(&self) -> &str {
        self.factor_type.as_deref().unwrap_or("<untyped>")
    }
}

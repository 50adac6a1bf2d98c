//! Factory — turns `FactorRequest` records into runtime trait objects.
//!
//! Built-in factor types are resolved by `create_picker` / `create_timing`.
//! A `FactorRegistry` layers caller-registered constructors on top, so an
//! embedding application (or a test) can add its own factor types without
//! touching this module. Every request is validated here; a worker never sees
//! a malformed factor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{Benchmark, Capital};

use super::pick::{
    window_from, GrowPicker, MeanRegimePicker, PriceMinMaxPicker, RegressAngPicker, Reversed,
    StockPicker, TopNGrowthPicker, DEFAULT_XD,
};
use super::request::FactorRequest;
use super::timing::{ChannelBreakdown, ChannelBreakout, MeanCross, SignalSide, TimingFactor};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during factor construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactorError {
    #[error("factor request #{index} is missing factor_type")]
    MissingFactorType { index: usize },
    #[error("unknown factor type: {0}")]
    UnknownFactor(String),
    #[error("invalid parameter `{param}` for {factor}: {reason}")]
    InvalidParam {
        factor: String,
        param: String,
        reason: String,
    },
    #[error("factor {0} has no batch (first_choice) mode")]
    FirstChoiceUnsupported(String),
    #[error("factor {0} only runs in batch mode; set first_choice = true")]
    PickModeUnsupported(String),
    #[error("factor {factor} emits {actual} signals but was listed as a {expected} factor")]
    SideMismatch {
        factor: String,
        expected: SignalSide,
        actual: SignalSide,
    },
}

/// Capital and benchmark handed to every pick-factor constructor.
#[derive(Debug, Clone, Copy)]
pub struct FactorContext<'a> {
    pub capital: &'a Capital,
    pub benchmark: &'a Benchmark,
}

impl<'a> FactorContext<'a> {
    pub fn new(capital: &'a Capital, benchmark: &'a Benchmark) -> Self {
        Self { capital, benchmark }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn invalid(factor: &str, param: &str, reason: impl Into<String>) -> FactorError {
    FactorError::InvalidParam {
        factor: factor.to_string(),
        param: param.to_string(),
        reason: reason.into(),
    }
}

/// Extract a named f64 parameter, falling back to `default`.
fn param(
    request: &FactorRequest,
    factor: &str,
    name: &str,
    default: f64,
) -> Result<f64, FactorError> {
    match request.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(factor, name, format!("must be finite, got {v}"))),
    }
}

/// Extract an optional non-negative whole-number parameter.
fn param_count_opt(
    request: &FactorRequest,
    factor: &str,
    name: &str,
) -> Result<Option<usize>, FactorError> {
    match request.params.get(name).copied() {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
        Some(v) => Err(invalid(
            factor,
            name,
            format!("must be a non-negative whole number, got {v}"),
        )),
    }
}

/// Extract a bar-count parameter that must be at least 1.
fn param_period(
    request: &FactorRequest,
    factor: &str,
    name: &str,
    default: usize,
) -> Result<usize, FactorError> {
    let value = param_count_opt(request, factor, name)?.unwrap_or(default);
    if value == 0 {
        return Err(invalid(factor, name, "must be >= 1"));
    }
    Ok(value)
}

fn ordered(
    factor: &str,
    lo_name: &str,
    lo: f64,
    hi_name: &str,
    hi: f64,
) -> Result<(), FactorError> {
    if lo > hi {
        return Err(invalid(factor, lo_name, format!("{lo} exceeds {hi_name} ({hi})")));
    }
    Ok(())
}

// ─── Pick factory ────────────────────────────────────────────────────

/// Create a built-in pick factor of type `factor_type`.
///
/// Window parameters shared by every pick factor: `xd` (default 252) and
/// `min_xd` (default `xd / 2`). Mode flags (`first_choice`, `reversed`) are
/// applied by the registry, not here.
pub fn create_picker(
    factor_type: &str,
    request: &FactorRequest,
    ctx: &FactorContext<'_>,
) -> Result<Box<dyn StockPicker>, FactorError> {
    let window = |default_xd: usize| -> Result<_, FactorError> {
        let xd = param_period(request, factor_type, "xd", default_xd)?;
        let min_xd = param_count_opt(request, factor_type, "min_xd")?;
        Ok(window_from(xd, min_xd))
    };

    match factor_type {
        "regress_ang" => {
            let min = param(request, factor_type, "threshold_ang_min", -90.0)?;
            let max = param(request, factor_type, "threshold_ang_max", 90.0)?;
            ordered(factor_type, "threshold_ang_min", min, "threshold_ang_max", max)?;
            Ok(Box::new(RegressAngPicker::new(min, max, window(DEFAULT_XD)?)))
        }
        "price_min_max" => {
            let min = param(request, factor_type, "threshold_price_min", 0.0)?;
            let max = param(
                request,
                factor_type,
                "threshold_price_max",
                ctx.capital.initial_cash,
            )?;
            ordered(factor_type, "threshold_price_min", min, "threshold_price_max", max)?;
            Ok(Box::new(PriceMinMaxPicker::new(min, max, window(DEFAULT_XD)?)))
        }
        "mean_regime" => {
            let mean_xd = param_period(request, factor_type, "mean_xd", 120)?;
            Ok(Box::new(MeanRegimePicker::new(mean_xd, window(DEFAULT_XD)?)))
        }
        "grow" => {
            let grow_xd = param_period(request, factor_type, "grow_xd", 20)?;
            let grow_num = param(request, factor_type, "grow_num", 20.0)?;
            Ok(Box::new(GrowPicker::new(grow_xd, grow_num, window(DEFAULT_XD)?)))
        }
        "top_n_growth" => {
            let n = param_period(request, factor_type, "n", 10)?;
            Ok(Box::new(TopNGrowthPicker::new(n, window(60)?)))
        }
        other => Err(FactorError::UnknownFactor(other.to_string())),
    }
}

// ─── Timing factory ──────────────────────────────────────────────────

/// Create a built-in timing factor of type `factor_type`.
pub fn create_timing(
    factor_type: &str,
    request: &FactorRequest,
) -> Result<Box<dyn TimingFactor>, FactorError> {
    match factor_type {
        "breakout" => {
            let xd = param_period(request, factor_type, "xd", 60)?;
            Ok(Box::new(ChannelBreakout::new(xd)))
        }
        "breakdown" => {
            let xd = param_period(request, factor_type, "xd", 20)?;
            Ok(Box::new(ChannelBreakdown::new(xd)))
        }
        "mean_cross" => {
            let xd = param_period(request, factor_type, "xd", 20)?;
            Ok(Box::new(MeanCross::new(xd)))
        }
        other => Err(FactorError::UnknownFactor(other.to_string())),
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Constructor for a caller-registered pick factor.
pub type PickerBuilder = Arc<
    dyn Fn(&FactorRequest, &FactorContext<'_>) -> Result<Box<dyn StockPicker>, FactorError>
        + Send
        + Sync,
>;

/// Constructor for a caller-registered timing factor.
pub type TimingBuilder =
    Arc<dyn Fn(&FactorRequest) -> Result<Box<dyn TimingFactor>, FactorError> + Send + Sync>;

/// Maps factor type names to constructors.
///
/// Registered names shadow built-ins of the same name.
#[derive(Clone, Default)]
pub struct FactorRegistry {
    pickers: HashMap<String, PickerBuilder>,
    timing: HashMap<String, TimingBuilder>,
}

impl fmt::Debug for FactorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pickers: Vec<&String> = self.pickers.keys().collect();
        let mut timing: Vec<&String> = self.timing.keys().collect();
        pickers.sort();
        timing.sort();
        f.debug_struct("FactorRegistry")
            .field("pickers", &pickers)
            .field("timing", &timing)
            .finish()
    }
}

impl FactorRegistry {
    /// Registry holding only the built-in factors.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_picker<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&FactorRequest, &FactorContext<'_>) -> Result<Box<dyn StockPicker>, FactorError>
            + Send
            + Sync
            + 'static,
    {
        self.pickers.insert(name.into(), Arc::new(builder));
    }

    pub fn register_timing<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&FactorRequest) -> Result<Box<dyn TimingFactor>, FactorError> + Send + Sync + 'static,
    {
        self.timing.insert(name.into(), Arc::new(builder));
    }

    /// Build the pick factor described by `request` (the `index`-th request of
    /// its list), honouring `first_choice` and `reversed`.
    pub fn picker(
        &self,
        index: usize,
        request: &FactorRequest,
        ctx: &FactorContext<'_>,
    ) -> Result<Box<dyn StockPicker>, FactorError> {
        let factor_type = request
            .factor_type
            .as_deref()
            .ok_or(FactorError::MissingFactorType { index })?;

        let picker = match self.pickers.get(factor_type) {
            Some(builder) => builder(request, ctx)?,
            None => create_picker(factor_type, request, ctx)?,
        };

        if request.first_choice {
            if !picker.supports_first_choice() {
                return Err(FactorError::FirstChoiceUnsupported(factor_type.to_string()));
            }
            if request.reversed {
                return Err(invalid(
                    factor_type,
                    "reversed",
                    "batch factors cannot be reversed",
                ));
            }
            return Ok(picker);
        }

        if !picker.supports_pick() {
            return Err(FactorError::PickModeUnsupported(factor_type.to_string()));
        }
        if request.reversed {
            return Ok(Box::new(Reversed::new(picker)));
        }
        Ok(picker)
    }

    /// Build the timing factor described by `request`, checking that it
    /// speaks for `side`.
    pub fn timing(
        &self,
        index: usize,
        request: &FactorRequest,
        side: SignalSide,
    ) -> Result<Box<dyn TimingFactor>, FactorError> {
        let factor_type = request
            .factor_type
            .as_deref()
            .ok_or(FactorError::MissingFactorType { index })?;

        if request.first_choice {
            return Err(FactorError::FirstChoiceUnsupported(factor_type.to_string()));
        }
        if request.reversed {
            return Err(invalid(
                factor_type,
                "reversed",
                "timing factors cannot be reversed",
            ));
        }

        let factor = match self.timing.get(factor_type) {
            Some(builder) => builder(request)?,
            None => create_timing(factor_type, request)?,
        };
        if factor.side() != side {
            return Err(FactorError::SideMismatch {
                factor: factor_type.to_string(),
                expected: side,
                actual: factor.side(),
            });
        }
        Ok(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SeriesWindow;
    use crate::domain::Series;

    fn ctx_parts() -> (Capital, Benchmark) {
        (Capital::default(), Benchmark::default())
    }

    #[test]
    fn builds_every_builtin_picker() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let registry = FactorRegistry::new();

        for name in ["regress_ang", "price_min_max", "mean_regime", "grow"] {
            let picker = registry
                .picker(0, &FactorRequest::new(name), &ctx)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(picker.name(), name);
            assert_eq!(picker.window(), SeriesWindow::new(252, 126));
        }

        let top = registry
            .picker(0, &FactorRequest::new("top_n_growth").as_first_choice(), &ctx)
            .unwrap();
        assert_eq!(top.window(), SeriesWindow::new(60, 30));
    }

    #[test]
    fn missing_factor_type_reports_index() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let err = FactorRegistry::new()
            .picker(3, &FactorRequest::default(), &ctx)
            .err()
            .unwrap();
        assert_eq!(err, FactorError::MissingFactorType { index: 3 });
    }

    #[test]
    fn unknown_type_rejected() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let err = FactorRegistry::new()
            .picker(0, &FactorRequest::new("nonexistent"), &ctx)
            .err()
            .unwrap();
        assert!(matches!(err, FactorError::UnknownFactor(name) if name == "nonexistent"));
    }

    #[test]
    fn mode_mismatches_are_construction_errors() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let registry = FactorRegistry::new();

        let batch_on_pick_only =
            registry.picker(0, &FactorRequest::new("grow").as_first_choice(), &ctx);
        assert!(matches!(
            batch_on_pick_only,
            Err(FactorError::FirstChoiceUnsupported(_))
        ));

        let pick_on_batch_only = registry.picker(0, &FactorRequest::new("top_n_growth"), &ctx);
        assert!(matches!(
            pick_on_batch_only,
            Err(FactorError::PickModeUnsupported(_))
        ));
    }

    #[test]
    fn invalid_params_rejected() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let registry = FactorRegistry::new();

        let zero_xd = FactorRequest::new("mean_regime").with_param("xd", 0.0);
        assert!(matches!(
            registry.picker(0, &zero_xd, &ctx),
            Err(FactorError::InvalidParam { param, .. }) if param == "xd"
        ));

        let fractional = FactorRequest::new("grow").with_param("grow_xd", 2.5);
        assert!(registry.picker(0, &fractional, &ctx).is_err());

        let inverted_band = FactorRequest::new("regress_ang")
            .with_param("threshold_ang_min", 30.0)
            .with_param("threshold_ang_max", 10.0);
        assert!(registry.picker(0, &inverted_band, &ctx).is_err());
    }

    #[test]
    fn price_max_defaults_to_capital() {
        let capital = Capital { initial_cash: 50.0 };
        let benchmark = Benchmark::default();
        let ctx = FactorContext::new(&capital, &benchmark);
        let picker = FactorRegistry::new()
            .picker(0, &FactorRequest::new("price_min_max"), &ctx)
            .unwrap();

        let cheap = Series::new("A", crate::indicators::make_bars(&[10.0, 20.0]));
        let dear = Series::new("B", crate::indicators::make_bars(&[10.0, 60.0]));
        assert!(picker.fit_pick(&cheap));
        assert!(!picker.fit_pick(&dear));
    }

    #[test]
    fn reversed_request_wraps_picker() {
        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let picker = FactorRegistry::new()
            .picker(0, &FactorRequest::new("mean_regime").inverted(), &ctx)
            .unwrap();
        assert_eq!(picker.name(), "mean_regime_reversed");
    }

    #[test]
    fn registered_picker_shadows_builtin() {
        struct AcceptAll;
        impl StockPicker for AcceptAll {
            fn name(&self) -> &str {
                "accept_all"
            }
            fn window(&self) -> SeriesWindow {
                SeriesWindow::new(1, 1)
            }
            fn fit_pick(&self, _series: &Series) -> bool {
                true
            }
        }

        let (capital, benchmark) = ctx_parts();
        let ctx = FactorContext::new(&capital, &benchmark);
        let mut registry = FactorRegistry::new();
        registry.register_picker("grow", |_, _| Ok(Box::new(AcceptAll)));

        let picker = registry.picker(0, &FactorRequest::new("grow"), &ctx).unwrap();
        assert_eq!(picker.name(), "accept_all");
    }

    #[test]
    fn timing_side_is_checked() {
        let registry = FactorRegistry::new();
        assert!(registry
            .timing(0, &FactorRequest::new("breakout"), SignalSide::Buy)
            .is_ok());
        assert!(matches!(
            registry.timing(0, &FactorRequest::new("breakdown"), SignalSide::Buy),
            Err(FactorError::SideMismatch { .. })
        ));
        assert!(registry
            .timing(0, &FactorRequest::new("breakout").inverted(), SignalSide::Buy)
            .is_err());
    }
}

//! Trend measures over a close series: regression angle and percent growth.

/// Angle in degrees of the least-squares line through `values`.
///
/// The series is first scaled so its maximum equals the x-axis span
/// (`len - 1`), which makes the angle comparable across price levels.
/// Returns `None` for fewer than two points, non-positive maxima or NaNs.
pub fn regress_angle(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let y_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if y_max <= 0.0 {
        return None;
    }

    let zoom = (n - 1) as f64 / y_max;
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() * zoom / n as f64;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, v) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (v * zoom - y_mean);
        var += dx * dx;
    }

    Some((cov / var).atan().to_degrees())
}

/// Percent change from `values[len - 1 - window]` to the last value.
pub fn growth_pct(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() <= window {
        return None;
    }
    let end = *values.last()?;
    let start = values[values.len() - 1 - window];
    if start <= 0.0 || !start.is_finite() || !end.is_finite() {
        return None;
    }
    Some((end - start) / start * 100.0)
}

//! Number and time formatting for terminal output.

/// Format seconds with a unit that keeps three significant places.
#[must_use]
pub fn format_seconds(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "n/a".to_string();
    }
    if secs < 0.001 {
        format!("{:.1}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.1}ms", secs * 1000.0)
    } else {
        format!("{secs:.3}s")
    }
}

/// Format a speedup factor, or `-` when there is no baseline.
#[must_use]
pub fn format_speedup(speedup: Option<f64>) -> String {
    match speedup {
        Some(x) if x.is_finite() => format!("{x:.2}x"),
        _ => "-".to_string(),
    }
}

/// Mean and spread as `mean ± stddev`.
#[must_use]
pub fn format_mean_stddev(mean: f64, stddev: f64) -> String {
    format!("{} ± {}", format_seconds(mean), format_seconds(stddev))
}

//! Mean and standard deviation over elapsed-time samples.

/// Summary of a sample of elapsed times, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub stddev: f64,
    pub count: usize,
}

/// Arithmetic mean. Returns 0 for an empty sample.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation. Returns 0 for fewer than two samples.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let sum_sq: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

/// Summarise a sample, or `None` when it is empty.
#[must_use]
pub fn summarize(samples: &[f64]) -> Option<Summary> {
    if samples.is_empty() {
        return None;
    }
    Some(Summary {
        mean: mean(samples),
        stddev: sample_std_dev(samples),
        count: samples.len(),
    })
}

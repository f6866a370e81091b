//! Order statistics over plain `f64` samples
//!
//! Percentiles interpolate linearly between the two nearest order
//! statistics, so the 0th and 100th percentiles are the sample min and max.

/// Percentile `q` (0..=100) of unsorted samples. Non-finite values are ignored.
///
/// Returns `None` when no finite samples remain.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

/// Percentile `q` (0..=100) of samples already sorted ascending
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Trailing rolling sum over `window` samples.
///
/// The first `window - 1` outputs sum whatever samples exist so far.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for (i, &v) in values.iter().enumerate() {
        acc += v;
        if i >= window {
            acc -= values[i - window];
        }
        out.push(acc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_linear_interpolation() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_relative_eq!(percentile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&v, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(&v, 60.0).unwrap(), 3.4, epsilon = 1e-12);
        assert_relative_eq!(percentile(&v, 100.0).unwrap(), 5.0);
    }

    #[test]
    fn test_percentile_ignores_nan() {
        let v = [f64::NAN, 10.0, 20.0];
        assert_relative_eq!(percentile(&v, 50.0).unwrap(), 15.0);
        assert!(percentile(&[f64::NAN], 50.0).is_none());
    }

    #[test]
    fn test_rolling_sum_partial_windows() {
        let r = rolling_sum(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(r, vec![1.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_relative_eq!(mean(&[-5.0, -4.0, -6.0]).unwrap(), -5.0);
    }
}

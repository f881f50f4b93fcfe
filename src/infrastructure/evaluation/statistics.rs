//! Sample statistics used to reconcile repeated runs

/// Running mean and sum of squared deviations (Welford).
///
/// Stays exact when every value is identical, so a perfectly stable axis
/// reports a spread of zero.
fn accumulate(sample: &[f64]) -> (f64, f64) {
    let mut m = 0.0;
    let mut m2 = 0.0;

    for (i, x) in sample.iter().enumerate() {
        let delta = x - m;
        m += delta / (i + 1) as f64;
        m2 += delta * (x - m);
    }

    (m, m2)
}

/// Arithmetic mean; `None` for an empty sample
pub fn mean(sample: &[f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    Some(accumulate(sample).0)
}

/// Sample variance (n-1 denominator); `None` with fewer than 2 values
pub fn variance(sample: &[f64]) -> Option<f64> {
    if sample.len() < 2 {
        return None;
    }

    let (_, m2) = accumulate(sample);
    Some(m2.max(0.0) / (sample.len() - 1) as f64)
}

/// Sample standard deviation
pub fn std_dev(sample: &[f64]) -> Option<f64> {
    variance(sample).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_variance() {
        let v = variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((v - 4.571428571428571).abs() < 1e-10);
        assert_eq!(variance(&[0.5]), None);
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[0.6, 0.8, 0.7]).unwrap();
        assert!((sd - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_identical_values_have_zero_spread() {
        assert_eq!(mean(&[0.4, 0.4, 0.4]), Some(0.4));
        assert_eq!(std_dev(&[0.4, 0.4, 0.4]), Some(0.0));
        assert_eq!(std_dev(&[0.7, 0.7, 0.7, 0.7, 0.7]), Some(0.0));
    }
}

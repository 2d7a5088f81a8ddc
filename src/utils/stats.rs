//! Descriptive statistics and currency helpers.

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Square root of [`population_variance`].
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// 50th percentile, see [`quantile`].
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Quantile with linear interpolation between order statistics.
///
/// Uses the `(n - 1) * q` position rule, so `quantile(xs, 0.25)` matches the
/// usual 25th percentile definition. Returns NaN for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Same as [`quantile`] for data that is already sorted ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    if lower == upper || upper >= n {
        sorted[lower.min(n - 1)]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Divide, substituting 0 when the denominator is zero or the result is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Round a currency amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Stable ascending rank order: indices sorted by value, ties by position.
pub fn stable_rank_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_daily_sessions() {
        assert_relative_eq!(mean(&[980.0, 1010.0, 1030.0, 1100.0]), 1030.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[12.5]), 12.5, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn population_variance_divides_by_n() {
        assert_relative_eq!(
            population_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            2.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(population_variance(&[7.0]), 0.0, epsilon = 1e-10);
        assert!(population_variance(&[]).is_nan());
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // position 0.75 -> 1 + 0.75 * (2 - 1)
        assert_relative_eq!(quantile(&values, 0.25), 1.75, epsilon = 1e-10);
        assert_relative_eq!(quantile(&values, 0.75), 3.25, epsilon = 1e-10);
        assert_relative_eq!(quantile(&values, 0.0), 1.0, epsilon = 1e-10);
        assert_relative_eq!(quantile(&values, 1.0), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn quantile_handles_unsorted_and_single() {
        assert_relative_eq!(quantile(&[5.0, 1.0, 3.0], 0.5), 3.0, epsilon = 1e-10);
        assert_relative_eq!(quantile(&[42.0], 0.9), 42.0, epsilon = 1e-10);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn median_even_length() {
        assert_relative_eq!(median(&[40.0, 10.0, 30.0, 20.0]), 25.0, epsilon = 1e-10);
    }

    #[test]
    fn safe_div_guards_zero_denominator() {
        assert_eq!(safe_div(10.0, 0.0), 0.0);
        assert_relative_eq!(safe_div(10.0, 4.0), 2.5, epsilon = 1e-10);
    }

    #[test]
    fn round_cents_keeps_two_decimals() {
        assert_relative_eq!(round_cents(19.999), 20.0, epsilon = 1e-10);
        assert_relative_eq!(round_cents(12.344), 12.34, epsilon = 1e-10);
    }

    #[test]
    fn stable_rank_order_breaks_ties_by_position() {
        let order = stable_rank_order(&[3.0, 1.0, 3.0, 0.0]);
        assert_eq!(order, vec![3, 1, 0, 2]);
    }
}

//! Rolling highest / lowest over a window.
//!
//! Warmup: first (n-1) values are 0.

pub fn calculate_highest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, f64::max)
}

pub fn calculate_lowest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, f64::min)
}

fn rolling(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return 0.0;
            }
            values[i + 1 - period..=i]
                .iter()
                .copied()
                .reduce(pick)
                .unwrap_or(0.0)
        })
        .collect()
}

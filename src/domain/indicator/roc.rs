//! ROC (Rate of Change).
//!
//! ROC(n)[i] = ((P[i] - P[i-n]) / P[i-n]) * 100
//! If P[i-n] == 0: ROC = 0
//! Warmup: first n values are 0.

pub fn calculate_roc(values: &[f64], period: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < period {
                return 0.0;
            }
            let prev = values[i - period];
            if prev == 0.0 {
                0.0
            } else {
                ((values[i] - prev) / prev) * 100.0
            }
        })
        .collect()
}

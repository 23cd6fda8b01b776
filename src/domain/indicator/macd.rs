//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded once the slow EMA is warm
//!
//! Warmup: line is 0 for the first (slow-1) values; signal is 0 for the
//! first (slow-1 + signal-1) values.

use crate::domain::indicator::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd_line(values: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    if fast == 0 || slow == 0 {
        return vec![0.0; values.len()];
    }
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);
    let warmup = fast.max(slow) - 1;

    (0..values.len())
        .map(|i| if i >= warmup { ema_fast[i] - ema_slow[i] } else { 0.0 })
        .collect()
}

pub fn calculate_macd_signal(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if fast == 0 || slow == 0 || signal == 0 {
        return out;
    }

    let line = calculate_macd_line(values, fast, slow);
    let line_warmup = fast.max(slow) - 1;
    let seed_end = line_warmup + signal;
    if seed_end > values.len() {
        return out;
    }

    let k = 2.0 / (signal as f64 + 1.0);
    let mut ema = line[line_warmup..seed_end].iter().sum::<f64>() / signal as f64;
    out[seed_end - 1] = ema;
    for i in seed_end..values.len() {
        ema = line[i] * k + ema * (1.0 - k);
        out[i] = ema;
    }

    out
}

//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values are 0 (n price changes are needed to seed).

pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let change = |i: usize| values[i] - values[i - 1];
    let gain = |c: f64| if c > 0.0 { c } else { 0.0 };
    let loss = |c: f64| if c < 0.0 { -c } else { 0.0 };
    let rsi = |avg_gain: f64, avg_loss: f64| {
        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        }
    };

    let mut avg_gain = (1..=period).map(|i| gain(change(i))).sum::<f64>() / period as f64;
    let mut avg_loss = (1..=period).map(|i| loss(change(i))).sum::<f64>() / period as f64;
    out[period] = rsi(avg_gain, avg_loss);

    for i in (period + 1)..values.len() {
        let c = change(i);
        avg_gain = (avg_gain * (period - 1) as f64 + gain(c)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(c)) / period as f64;
        out[i] = rsi(avg_gain, avg_loss);
    }

    out
}

//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) values are 0 on every band.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stddev::calculate_stddev;

pub struct Bands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn calculate_bollinger(values: &[f64], period: usize, multiplier: f64) -> Bands {
    let middle = calculate_sma(values, period);
    let stddev = calculate_stddev(values, period);
    let warm = |i: usize| period > 0 && i + 1 >= period;

    let upper = (0..values.len())
        .map(|i| if warm(i) { middle[i] + multiplier * stddev[i] } else { 0.0 })
        .collect();
    let lower = (0..values.len())
        .map(|i| if warm(i) { middle[i] - multiplier * stddev[i] } else { 0.0 })
        .collect();

    Bands {
        upper,
        middle,
        lower,
    }
}

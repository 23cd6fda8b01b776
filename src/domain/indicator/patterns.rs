//! Candlestick pattern flags: 1.0 where the pattern is present, 0.0
//! elsewhere.

use crate::domain::ohlcv::OhlcvBar;

/// Body no larger than this fraction of the bar's range counts as a doji.
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// Minimum lower-shadow share of the range for a hammer.
pub const HAMMER_SHADOW_RATIO: f64 = 0.6;

fn flag(cond: bool) -> f64 {
    if cond { 1.0 } else { 0.0 }
}

fn is_bullish(bar: &OhlcvBar) -> bool {
    bar.close > bar.open
}

fn is_bearish(bar: &OhlcvBar) -> bool {
    bar.close < bar.open
}

pub fn calculate_doji(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .map(|bar| {
            let range = bar.high - bar.low;
            flag(range > 0.0 && (bar.close - bar.open).abs() <= DOJI_BODY_RATIO * range)
        })
        .collect()
}

/// Long lower shadow that dominates the upper shadow.
pub fn calculate_hammer(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .map(|bar| {
            let range = bar.high - bar.low;
            if range <= 0.0 {
                return 0.0;
            }
            let lower = (bar.open.min(bar.close) - bar.low) / range;
            let upper = (bar.high - bar.open.max(bar.close)) / range;
            flag(lower > HAMMER_SHADOW_RATIO && lower > upper)
        })
        .collect()
}

/// A bullish body that fully covers the previous bearish body.
pub fn calculate_bullish_engulfing(bars: &[OhlcvBar]) -> Vec<f64> {
    (0..bars.len())
        .map(|i| {
            if i == 0 {
                return 0.0;
            }
            let (prev, cur) = (&bars[i - 1], &bars[i]);
            flag(
                is_bearish(prev)
                    && is_bullish(cur)
                    && cur.open <= prev.close
                    && cur.close >= prev.open,
            )
        })
        .collect()
}

/// A bearish body that fully covers the previous bullish body.
pub fn calculate_bearish_engulfing(bars: &[OhlcvBar]) -> Vec<f64> {
    (0..bars.len())
        .map(|i| {
            if i == 0 {
                return 0.0;
            }
            let (prev, cur) = (&bars[i - 1], &bars[i]);
            flag(
                is_bullish(prev)
                    && is_bearish(cur)
                    && cur.open >= prev.close
                    && cur.close <= prev.open,
            )
        })
        .collect()
}

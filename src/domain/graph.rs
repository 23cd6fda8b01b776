//! Derived-series operations.
//!
//! Every operation names its result with an identity built from the
//! operation, its parameters and its operands' identities, then asks the
//! series cache for it. Requesting the same computation twice, from any
//! thread, returns the same shared [`Series`].
//!
//! Operands that are synchronized views are read through their logical
//! index space. Results are plain, unsynchronized series of the operands'
//! logical length.

use crate::domain::cache::{Builder, Cache, CacheStats};
use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::{Identifiable, Identity};
use crate::domain::indicator::IndicatorKind;
use crate::domain::ohlcv::Bars;
use crate::domain::series::Series;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div if b == 0.0 => 0.0,
            BinaryOp::Div => a / b,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOp::Add => "ADD",
            BinaryOp::Sub => "SUB",
            BinaryOp::Mul => "MUL",
            BinaryOp::Div => "DIV",
        };
        f.write_str(name)
    }
}

/// Builder for one derived series.
///
/// `len` is the logical length every operand had when the request was made;
/// a cached result of any other length is stale.
struct SeriesOp<'a> {
    id: Identity,
    len: usize,
    compute: Box<dyn Fn() -> Result<Vec<f64>> + 'a>,
}

impl Builder<Series> for SeriesOp<'_> {
    fn id(&self) -> Identity {
        self.id.clone()
    }

    fn make(&self) -> Result<Series> {
        let values = (self.compute)()?;
        if values.len() != self.len {
            return Err(SimtraderError::Builder {
                id: self.id.to_string(),
                reason: format!("produced {} values, expected {}", values.len(), self.len),
            });
        }
        Ok(Series::with_id(self.id.clone(), values))
    }

    fn is_consistent(&self, existing: &Series) -> bool {
        existing.len() == self.len
    }
}

/// Handle for requesting derived series through a shared cache.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct SeriesGraph {
    cache: Arc<Cache<Series>>,
}

impl SeriesGraph {
    pub fn new(cache: Arc<Cache<Series>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<Cache<Series>> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn request(&self, op: SeriesOp<'_>) -> Result<Arc<Series>> {
        self.cache.find_and_add(&op)
    }

    fn binary(&self, op: BinaryOp, left: &Series, right: &Series) -> Result<Arc<Series>> {
        if left.len() != right.len() {
            return Err(SimtraderError::OperationOnUnequalSizeSeries {
                left: left.len(),
                right: right.len(),
            });
        }
        self.request(SeriesOp {
            id: Identity::derive(op, &[left.id(), right.id()]),
            len: left.len(),
            compute: Box::new(move || {
                let a = left.to_vec()?;
                let b = right.to_vec()?;
                Ok(a.iter().zip(&b).map(|(&x, &y)| op.apply(x, y)).collect())
            }),
        })
    }

    fn scalar(&self, op: BinaryOp, operand: &Series, scalar: f64) -> Result<Arc<Series>> {
        self.request(SeriesOp {
            id: Identity::derive(format!("{op}({scalar})"), &[operand.id()]),
            len: operand.len(),
            compute: Box::new(move || {
                Ok(operand
                    .to_vec()?
                    .into_iter()
                    .map(|x| op.apply(x, scalar))
                    .collect())
            }),
        })
    }

    pub fn add(&self, left: &Series, right: &Series) -> Result<Arc<Series>> {
        self.binary(BinaryOp::Add, left, right)
    }

    pub fn sub(&self, left: &Series, right: &Series) -> Result<Arc<Series>> {
        self.binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(&self, left: &Series, right: &Series) -> Result<Arc<Series>> {
        self.binary(BinaryOp::Mul, left, right)
    }

    /// Elementwise division; positions where `right` is zero hold 0.
    pub fn div(&self, left: &Series, right: &Series) -> Result<Arc<Series>> {
        self.binary(BinaryOp::Div, left, right)
    }

    pub fn add_scalar(&self, operand: &Series, scalar: f64) -> Result<Arc<Series>> {
        self.scalar(BinaryOp::Add, operand, scalar)
    }

    pub fn sub_scalar(&self, operand: &Series, scalar: f64) -> Result<Arc<Series>> {
        self.scalar(BinaryOp::Sub, operand, scalar)
    }

    pub fn mul_scalar(&self, operand: &Series, scalar: f64) -> Result<Arc<Series>> {
        self.scalar(BinaryOp::Mul, operand, scalar)
    }

    pub fn div_scalar(&self, operand: &Series, scalar: f64) -> Result<Arc<Series>> {
        self.scalar(BinaryOp::Div, operand, scalar)
    }

    /// Lags the series by `n`: `out[i] = in[i - n]`, zero for `i < n`.
    pub fn shift_right(&self, operand: &Series, n: usize) -> Result<Arc<Series>> {
        self.request(SeriesOp {
            id: Identity::derive(format!("SHIFT_RIGHT({n})"), &[operand.id()]),
            len: operand.len(),
            compute: Box::new(move || {
                let values = operand.to_vec()?;
                Ok((0..values.len())
                    .map(|i| if i >= n { values[i - n] } else { 0.0 })
                    .collect())
            }),
        })
    }

    /// Leads the series by `n`: `out[i] = in[i + n]`, zero past the end.
    pub fn shift_left(&self, operand: &Series, n: usize) -> Result<Arc<Series>> {
        self.request(SeriesOp {
            id: Identity::derive(format!("SHIFT_LEFT({n})"), &[operand.id()]),
            len: operand.len(),
            compute: Box::new(move || {
                let values = operand.to_vec()?;
                Ok((0..values.len())
                    .map(|i| values.get(i + n).copied().unwrap_or(0.0))
                    .collect())
            }),
        })
    }

    /// Any single-series indicator over `operand`.
    pub fn indicator(&self, kind: IndicatorKind, operand: &Series) -> Result<Arc<Series>> {
        kind.validate()?;
        if kind.needs_bars() {
            return Err(SimtraderError::InvalidIndicator {
                spec: kind.to_string(),
                reason: "requires bar data, not a single series".into(),
            });
        }
        self.request(SeriesOp {
            id: Identity::derive(kind, &[operand.id()]),
            len: operand.len(),
            compute: Box::new(move || kind.compute_values(&operand.to_vec()?)),
        })
    }

    /// Any indicator over a bar collection. Series indicators run on the
    /// close series, so they share cache entries with
    /// [`indicator`](Self::indicator) over `bars.close_series()`.
    pub fn bar_indicator(&self, kind: IndicatorKind, bars: &Bars) -> Result<Arc<Series>> {
        if !kind.needs_bars() {
            return self.indicator(kind, bars.close_series());
        }
        kind.validate()?;
        self.request(SeriesOp {
            id: Identity::derive(kind, &[bars.id()]),
            len: bars.size(),
            compute: Box::new(move || Ok(kind.compute_bars(&bars.to_vec()?))),
        })
    }

    pub fn sma(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Sma(period), operand)
    }

    pub fn ema(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Ema(period), operand)
    }

    pub fn wma(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Wma(period), operand)
    }

    pub fn stddev(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Stddev(period), operand)
    }

    pub fn roc(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Roc(period), operand)
    }

    pub fn rsi(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Rsi(period), operand)
    }

    pub fn highest(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Highest(period), operand)
    }

    pub fn lowest(&self, operand: &Series, period: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Lowest(period), operand)
    }

    /// The multiplier is kept to two decimal places.
    pub fn bollinger_upper(
        &self,
        operand: &Series,
        period: usize,
        multiplier: f64,
    ) -> Result<Arc<Series>> {
        let stddev_mult_x100 = multiplier_x100("BOLLINGER_UPPER", period, multiplier)?;
        let kind = IndicatorKind::BollingerUpper {
            period,
            stddev_mult_x100,
        };
        self.indicator(kind, operand)
    }

    pub fn bollinger_lower(
        &self,
        operand: &Series,
        period: usize,
        multiplier: f64,
    ) -> Result<Arc<Series>> {
        let stddev_mult_x100 = multiplier_x100("BOLLINGER_LOWER", period, multiplier)?;
        let kind = IndicatorKind::BollingerLower {
            period,
            stddev_mult_x100,
        };
        self.indicator(kind, operand)
    }

    pub fn macd_line(&self, operand: &Series, fast: usize, slow: usize) -> Result<Arc<Series>> {
        self.indicator(IndicatorKind::Macd { fast, slow }, operand)
    }

    pub fn atr(&self, bars: &Bars, period: usize) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::Atr(period), bars)
    }

    pub fn obv(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::Obv, bars)
    }

    pub fn typical_price(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::TypicalPrice, bars)
    }

    pub fn doji(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::Doji, bars)
    }

    pub fn hammer(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::Hammer, bars)
    }

    pub fn bullish_engulfing(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::BullishEngulfing, bars)
    }

    pub fn bearish_engulfing(&self, bars: &Bars) -> Result<Arc<Series>> {
        self.bar_indicator(IndicatorKind::BearishEngulfing, bars)
    }
}

/// Band width in hundredths, checked against the caller's value before
/// rounding.
fn multiplier_x100(name: &str, period: usize, multiplier: f64) -> Result<u32> {
    let invalid = |reason: &str| SimtraderError::InvalidIndicator {
        spec: format!("{}({},{})", name, period, multiplier),
        reason: reason.to_string(),
    };
    if !(multiplier > 0.0 && multiplier.is_finite()) {
        return Err(invalid("multiplier must be a positive number"));
    }
    let scaled = (multiplier * 100.0).round();
    if scaled < 1.0 {
        return Err(invalid("multiplier must be at least 0.01"));
    }
    if scaled > u32::MAX as f64 {
        return Err(invalid("multiplier is too large"));
    }
    Ok(scaled as u32)
}

//! Technical indicator math.
//!
//! Each submodule is a pure function from input values (or bars) to an
//! output vector of the same length; warm-up positions hold 0.0.
//! [`IndicatorKind`] names an indicator with its parameters. Its `Display`
//! form is the operation part of a derived series' identity, and `FromStr`
//! parses the same text back.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod extremes;
pub mod macd;
pub mod obv;
pub mod patterns;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod wma;

use crate::domain::error::{Result, SimtraderError};
use crate::domain::ohlcv::OhlcvBar;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Rsi(usize),
    Roc(usize),
    Stddev(usize),
    Highest(usize),
    Lowest(usize),
    BollingerUpper {
        period: usize,
        stddev_mult_x100: u32,
    },
    BollingerLower {
        period: usize,
        stddev_mult_x100: u32,
    },
    Macd {
        fast: usize,
        slow: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Atr(usize),
    Obv,
    TypicalPrice,
    Doji,
    Hammer,
    BullishEngulfing,
    BearishEngulfing,
}

impl IndicatorKind {
    /// Whether the indicator reads whole bars rather than a single series.
    pub fn needs_bars(&self) -> bool {
        matches!(
            self,
            IndicatorKind::Atr(_)
                | IndicatorKind::Obv
                | IndicatorKind::TypicalPrice
                | IndicatorKind::Doji
                | IndicatorKind::Hammer
                | IndicatorKind::BullishEngulfing
                | IndicatorKind::BearishEngulfing
        )
    }

    /// Rejects zero periods and multipliers, which `FromStr` never produces
    /// but direct construction can.
    pub fn validate(&self) -> Result<()> {
        let params: Vec<usize> = match *self {
            IndicatorKind::Sma(n)
            | IndicatorKind::Ema(n)
            | IndicatorKind::Wma(n)
            | IndicatorKind::Rsi(n)
            | IndicatorKind::Roc(n)
            | IndicatorKind::Stddev(n)
            | IndicatorKind::Highest(n)
            | IndicatorKind::Lowest(n)
            | IndicatorKind::Atr(n) => vec![n],
            IndicatorKind::BollingerUpper {
                period,
                stddev_mult_x100,
            }
            | IndicatorKind::BollingerLower {
                period,
                stddev_mult_x100,
            } => {
                if stddev_mult_x100 == 0 {
                    return Err(SimtraderError::InvalidIndicator {
                        spec: self.to_string(),
                        reason: "multiplier must be positive".into(),
                    });
                }
                vec![period]
            }
            IndicatorKind::Macd { fast, slow } => vec![fast, slow],
            IndicatorKind::MacdSignal { fast, slow, signal } => vec![fast, slow, signal],
            _ => Vec::new(),
        };
        if params.contains(&0) {
            return Err(SimtraderError::InvalidIndicator {
                spec: self.to_string(),
                reason: "period must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn compute_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        let out = match *self {
            IndicatorKind::Sma(n) => sma::calculate_sma(values, n),
            IndicatorKind::Ema(n) => ema::calculate_ema(values, n),
            IndicatorKind::Wma(n) => wma::calculate_wma(values, n),
            IndicatorKind::Rsi(n) => rsi::calculate_rsi(values, n),
            IndicatorKind::Roc(n) => roc::calculate_roc(values, n),
            IndicatorKind::Stddev(n) => stddev::calculate_stddev(values, n),
            IndicatorKind::Highest(n) => extremes::calculate_highest(values, n),
            IndicatorKind::Lowest(n) => extremes::calculate_lowest(values, n),
            IndicatorKind::BollingerUpper {
                period,
                stddev_mult_x100,
            } => bollinger::calculate_bollinger(values, period, mult(stddev_mult_x100)).upper,
            IndicatorKind::BollingerLower {
                period,
                stddev_mult_x100,
            } => bollinger::calculate_bollinger(values, period, mult(stddev_mult_x100)).lower,
            IndicatorKind::Macd { fast, slow } => macd::calculate_macd_line(values, fast, slow),
            IndicatorKind::MacdSignal { fast, slow, signal } => {
                macd::calculate_macd_signal(values, fast, slow, signal)
            }
            _ => {
                return Err(SimtraderError::InvalidIndicator {
                    spec: self.to_string(),
                    reason: "requires bar data, not a single series".into(),
                });
            }
        };
        Ok(out)
    }

    /// Bar-based indicators read the bars directly; series indicators run
    /// over closing prices.
    pub fn compute_bars(&self, bars: &[OhlcvBar]) -> Vec<f64> {
        match *self {
            IndicatorKind::Atr(n) => atr::calculate_atr(bars, n),
            IndicatorKind::Obv => obv::calculate_obv(bars),
            IndicatorKind::TypicalPrice => bars.iter().map(OhlcvBar::typical_price).collect(),
            IndicatorKind::Doji => patterns::calculate_doji(bars),
            IndicatorKind::Hammer => patterns::calculate_hammer(bars),
            IndicatorKind::BullishEngulfing => patterns::calculate_bullish_engulfing(bars),
            IndicatorKind::BearishEngulfing => patterns::calculate_bearish_engulfing(bars),
            _ => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                self.compute_values(&closes).unwrap_or_default()
            }
        }
    }
}

fn mult(stddev_mult_x100: u32) -> f64 {
    stddev_mult_x100 as f64 / 100.0
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Wma(period) => write!(f, "WMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Roc(period) => write!(f, "ROC({})", period),
            IndicatorKind::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorKind::Highest(period) => write!(f, "HIGHEST({})", period),
            IndicatorKind::Lowest(period) => write!(f, "LOWEST({})", period),
            IndicatorKind::BollingerUpper {
                period,
                stddev_mult_x100,
            } => write!(f, "BOLLINGER_UPPER({},{})", period, mult(*stddev_mult_x100)),
            IndicatorKind::BollingerLower {
                period,
                stddev_mult_x100,
            } => write!(f, "BOLLINGER_LOWER({},{})", period, mult(*stddev_mult_x100)),
            IndicatorKind::Macd { fast, slow } => write!(f, "MACD({},{})", fast, slow),
            IndicatorKind::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorKind::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKind::Obv => write!(f, "OBV"),
            IndicatorKind::TypicalPrice => write!(f, "TYPICAL_PRICE"),
            IndicatorKind::Doji => write!(f, "DOJI"),
            IndicatorKind::Hammer => write!(f, "HAMMER"),
            IndicatorKind::BullishEngulfing => write!(f, "BULLISH_ENGULFING"),
            IndicatorKind::BearishEngulfing => write!(f, "BEARISH_ENGULFING"),
        }
    }
}

impl FromStr for IndicatorKind {
    type Err = SimtraderError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| SimtraderError::InvalidIndicator {
            spec: input.to_string(),
            reason: reason.to_string(),
        };

        let spec = input.trim().to_uppercase();
        let (name, args): (&str, Vec<&str>) = match spec.find('(') {
            Some(open) => {
                let inner = spec
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("missing closing parenthesis"))?;
                (
                    spec[..open].trim(),
                    inner[open + 1..].split(',').map(str::trim).collect(),
                )
            }
            None => (spec.as_str(), Vec::new()),
        };

        let period = |i: usize| -> Result<usize> {
            match args[i].parse::<usize>() {
                Ok(0) => Err(invalid("period must be positive")),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid("period must be a positive integer")),
            }
        };
        let multiplier = |i: usize| -> Result<u32> {
            match args[i].parse::<f64>() {
                Ok(m) if m > 0.0 && m.is_finite() => Ok((m * 100.0).round() as u32),
                _ => Err(invalid("multiplier must be a positive number")),
            }
        };

        let kind = match (name, args.len()) {
            ("SMA", 1) => IndicatorKind::Sma(period(0)?),
            ("EMA", 1) => IndicatorKind::Ema(period(0)?),
            ("WMA", 1) => IndicatorKind::Wma(period(0)?),
            ("RSI", 1) => IndicatorKind::Rsi(period(0)?),
            ("ROC", 1) => IndicatorKind::Roc(period(0)?),
            ("STDDEV", 1) => IndicatorKind::Stddev(period(0)?),
            ("HIGHEST", 1) => IndicatorKind::Highest(period(0)?),
            ("LOWEST", 1) => IndicatorKind::Lowest(period(0)?),
            ("BOLLINGER_UPPER", 2) => IndicatorKind::BollingerUpper {
                period: period(0)?,
                stddev_mult_x100: multiplier(1)?,
            },
            ("BOLLINGER_LOWER", 2) => IndicatorKind::BollingerLower {
                period: period(0)?,
                stddev_mult_x100: multiplier(1)?,
            },
            ("MACD", 2) => IndicatorKind::Macd {
                fast: period(0)?,
                slow: period(1)?,
            },
            ("MACD_SIGNAL", 3) => IndicatorKind::MacdSignal {
                fast: period(0)?,
                slow: period(1)?,
                signal: period(2)?,
            },
            ("ATR", 1) => IndicatorKind::Atr(period(0)?),
            ("OBV", 0) => IndicatorKind::Obv,
            ("TYPICAL_PRICE", 0) => IndicatorKind::TypicalPrice,
            ("DOJI", 0) => IndicatorKind::Doji,
            ("HAMMER", 0) => IndicatorKind::Hammer,
            ("BULLISH_ENGULFING", 0) => IndicatorKind::BullishEngulfing,
            ("BEARISH_ENGULFING", 0) => IndicatorKind::BearishEngulfing,
            (
                "SMA" | "EMA" | "WMA" | "RSI" | "ROC" | "STDDEV" | "HIGHEST" | "LOWEST"
                | "BOLLINGER_UPPER" | "BOLLINGER_LOWER" | "MACD" | "MACD_SIGNAL" | "ATR" | "OBV"
                | "TYPICAL_PRICE" | "DOJI" | "HAMMER" | "BULLISH_ENGULFING"
                | "BEARISH_ENGULFING",
                _,
            ) => return Err(invalid("wrong number of parameters")),
            _ => return Err(invalid("unknown indicator")),
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn display_sma() {
        assert_eq!(IndicatorKind::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn display_bollinger() {
        let boll = IndicatorKind::BollingerUpper {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER_UPPER(20,2)");
        let boll = IndicatorKind::BollingerLower {
            period: 20,
            stddev_mult_x100: 250,
        };
        assert_eq!(boll.to_string(), "BOLLINGER_LOWER(20,2.5)");
    }

    #[test]
    fn display_macd_signal() {
        let macd = IndicatorKind::MacdSignal {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD_SIGNAL(12,26,9)");
    }

    #[test]
    fn parse_round_trips_display() {
        for text in [
            "SMA(20)",
            "EMA(12)",
            "WMA(5)",
            "RSI(14)",
            "ROC(3)",
            "STDDEV(10)",
            "HIGHEST(7)",
            "LOWEST(7)",
            "BOLLINGER_UPPER(20,2)",
            "BOLLINGER_LOWER(20,2.5)",
            "MACD(12,26)",
            "MACD_SIGNAL(12,26,9)",
            "ATR(14)",
            "OBV",
            "TYPICAL_PRICE",
            "DOJI",
            "HAMMER",
            "BULLISH_ENGULFING",
            "BEARISH_ENGULFING",
        ] {
            let kind: IndicatorKind = text.parse().unwrap();
            assert_eq!(kind.to_string(), text);
        }
    }

    #[test]
    fn parse_is_case_and_space_insensitive() {
        let kind: IndicatorKind = " sma( 10 ) ".parse().unwrap();
        assert_eq!(kind, IndicatorKind::Sma(10));
    }

    #[test]
    fn parse_rejects_zero_period() {
        let err = "SMA(0)".parse::<IndicatorKind>().unwrap_err();
        assert!(matches!(err, SimtraderError::InvalidIndicator { .. }));
    }

    #[test]
    fn parse_rejects_unknown_and_malformed() {
        assert!("FOO(3)".parse::<IndicatorKind>().is_err());
        assert!("SMA(3".parse::<IndicatorKind>().is_err());
        assert!("SMA(3,4)".parse::<IndicatorKind>().is_err());
        assert!("SMA".parse::<IndicatorKind>().is_err());
        assert!("BOLLINGER_UPPER(20,-1)".parse::<IndicatorKind>().is_err());
    }

    #[test]
    fn bar_indicators_reject_series_input() {
        let err = IndicatorKind::Obv.compute_values(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SimtraderError::InvalidIndicator { .. }));
    }

    #[test]
    fn series_indicators_on_bars_use_close() {
        let bars: Vec<OhlcvBar> = [10.0, 20.0, 30.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                open: close,
                high: close + 5.0,
                low: close - 5.0,
                close,
                volume: 100,
            })
            .collect();
        assert_eq!(
            IndicatorKind::Sma(3).compute_bars(&bars),
            vec![0.0, 0.0, 20.0]
        );
        assert_eq!(
            IndicatorKind::TypicalPrice.compute_bars(&bars),
            vec![10.0, 20.0, 30.0]
        );
    }
}

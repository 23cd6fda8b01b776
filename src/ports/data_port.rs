//! Price data access port.

use crate::domain::error::Result;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily OHLCV bars.
///
/// Implementations return bars sorted by date, restricted to the inclusive
/// `[start_date, end_date]` range. An unknown symbol is an error; a known
/// symbol with no bars in range is an empty vector.
pub trait DataPort: Send + Sync {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>>;

    /// First date, last date and bar count, or `None` if the symbol has no
    /// bars.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>>;
}

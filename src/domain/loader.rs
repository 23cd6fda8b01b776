//! Cached loading of bar collections.

use crate::domain::cache::{Builder, Cache};
use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::Identity;
use crate::domain::ohlcv::Bars;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Fetches one symbol's bars for a date range through a [`DataPort`].
pub struct BarsBuilder<'a> {
    pub data: &'a dyn DataPort,
    pub code: &'a str,
    pub exchange: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Builder<Bars> for BarsBuilder<'_> {
    fn id(&self) -> Identity {
        Identity::new(format!(
            "BARS({},{},{},{})",
            self.code, self.exchange, self.start, self.end
        ))
    }

    fn make(&self) -> Result<Bars> {
        let bars = self
            .data
            .fetch_ohlcv(self.code, self.exchange, self.start, self.end)?;
        if bars.is_empty() {
            return Err(SimtraderError::NoData {
                code: self.code.to_string(),
                exchange: self.exchange.to_string(),
            });
        }
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(SimtraderError::Data {
                reason: format!(
                    "{}.{}: bars not in ascending date order at {}",
                    self.code, self.exchange, pair[1].date
                ),
            });
        }
        debug!(
            code = self.code,
            exchange = self.exchange,
            bars = bars.len(),
            "loaded bars"
        );
        Ok(Bars::with_id(self.id(), self.code, self.exchange, bars))
    }
}

pub fn load_bars(
    cache: &Cache<Bars>,
    data: &dyn DataPort,
    code: &str,
    exchange: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Arc<Bars>> {
    cache.find_and_add(&BarsBuilder {
        data,
        code,
        exchange,
        start,
        end,
    })
}

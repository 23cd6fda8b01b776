//! OHLCV bars and bar collections.

use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::{Identifiable, Identity};
use crate::domain::series::Series;
use crate::domain::synchronizer::Synchronizer;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// An immutable collection of bars for one symbol.
///
/// Each price field is also exposed as a [`Series`] sharing the
/// collection's identity. Synchronizing produces a view over the same
/// storage whose logical index space is another collection's time axis.
#[derive(Debug, Clone)]
pub struct Bars {
    id: Identity,
    /// Identity of the unsynchronized physical collection.
    base_id: Identity,
    code: String,
    exchange: String,
    bars: Arc<Vec<OhlcvBar>>,
    open: Series,
    high: Series,
    low: Series,
    close: Series,
    volume: Series,
    sync: Option<Arc<Synchronizer>>,
}

impl Bars {
    /// A user-assembled collection with a process-unique identity.
    pub fn new(code: &str, exchange: &str, bars: Vec<OhlcvBar>) -> Self {
        let id = Identity::unique(&format!("BARS({code},{exchange})"));
        Self::with_id(id, code, exchange, bars)
    }

    pub fn with_id(id: Identity, code: &str, exchange: &str, bars: Vec<OhlcvBar>) -> Self {
        let field = |name: &str, f: fn(&OhlcvBar) -> f64| {
            Series::with_id(
                Identity::derive(name, &[&id]),
                bars.iter().map(f).collect(),
            )
        };
        let open = field("OPEN", |b| b.open);
        let high = field("HIGH", |b| b.high);
        let low = field("LOW", |b| b.low);
        let close = field("CLOSE", |b| b.close);
        let volume = field("VOLUME", |b| b.volume as f64);

        Self {
            base_id: id.clone(),
            id,
            code: code.to_string(),
            exchange: exchange.to_string(),
            bars: Arc::new(bars),
            open,
            high,
            low,
            close,
            volume,
            sync: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Identity of the physical collection, whether or not this is a
    /// synchronized view of it.
    pub fn base_id(&self) -> &Identity {
        &self.base_id
    }

    /// Logical size.
    pub fn size(&self) -> usize {
        match &self.sync {
            Some(sync) => sync.size(),
            None => self.bars.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Bars as stored, ignoring any synchronizer.
    pub fn physical(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Result<&OhlcvBar> {
        let physical = match &self.sync {
            Some(sync) => sync.index(index)?,
            None => index,
        };
        self.bars
            .get(physical)
            .ok_or(SimtraderError::IndexOutOfRange {
                index: physical,
                size: self.bars.len(),
            })
    }

    pub fn open(&self, index: usize) -> Result<f64> {
        Ok(self.bar(index)?.open)
    }

    pub fn high(&self, index: usize) -> Result<f64> {
        Ok(self.bar(index)?.high)
    }

    pub fn low(&self, index: usize) -> Result<f64> {
        Ok(self.bar(index)?.low)
    }

    pub fn close(&self, index: usize) -> Result<f64> {
        Ok(self.bar(index)?.close)
    }

    pub fn volume(&self, index: usize) -> Result<i64> {
        Ok(self.bar(index)?.volume)
    }

    /// Timestamp at a logical index. Synchronized collections report the
    /// reference time axis, not the date of the forward-filled bar.
    pub fn time(&self, index: usize) -> Result<NaiveDate> {
        match &self.sync {
            Some(sync) => sync.time(index),
            None => Ok(self.bar(index)?.date),
        }
    }

    /// Logical time axis.
    pub fn times(&self) -> Vec<NaiveDate> {
        match &self.sync {
            Some(sync) => sync.times().to_vec(),
            None => self.bars.iter().map(|b| b.date).collect(),
        }
    }

    /// Bars in logical order, dated on the logical time axis.
    pub fn to_vec(&self) -> Result<Vec<OhlcvBar>> {
        (0..self.size())
            .map(|i| {
                let mut bar = self.bar(i)?.clone();
                bar.date = self.time(i)?;
                Ok(bar)
            })
            .collect()
    }

    pub fn open_series(&self) -> &Series {
        &self.open
    }

    pub fn high_series(&self) -> &Series {
        &self.high
    }

    pub fn low_series(&self) -> &Series {
        &self.low
    }

    pub fn close_series(&self) -> &Series {
        &self.close
    }

    pub fn volume_series(&self) -> &Series {
        &self.volume
    }

    /// Builds a synchronizer against `reference` and returns a view of this
    /// collection read through it.
    pub fn synchronize(&self, reference: &Bars) -> Result<Bars> {
        let sync = Synchronizer::create(
            reference.id(),
            &reference.times(),
            &self.base_id,
            &self.physical_times(),
        )?;
        Ok(self.synchronized_with(Arc::new(sync)))
    }

    /// Attaches an existing synchronizer to the collection and every owned
    /// series. Physical storage is shared, not copied. Any synchronizer
    /// already attached is replaced.
    pub fn synchronized_with(&self, sync: Arc<Synchronizer>) -> Bars {
        let base = self.unsynchronized();
        Bars {
            id: Identity::derive("SYNCED", &[&self.base_id, sync.id()]),
            base_id: self.base_id.clone(),
            code: self.code.clone(),
            exchange: self.exchange.clone(),
            bars: Arc::clone(&self.bars),
            open: base.open.synchronized(Arc::clone(&sync)),
            high: base.high.synchronized(Arc::clone(&sync)),
            low: base.low.synchronized(Arc::clone(&sync)),
            close: base.close.synchronized(Arc::clone(&sync)),
            volume: base.volume.synchronized(Arc::clone(&sync)),
            sync: Some(sync),
        }
    }

    /// The physical collection this one is a view of.
    pub fn unsynchronized(&self) -> Bars {
        if self.sync.is_none() {
            return self.clone();
        }
        let base_field = |series: &Series, name: &str| {
            series.base(Identity::derive(name, &[&self.base_id]))
        };
        Bars {
            id: self.base_id.clone(),
            base_id: self.base_id.clone(),
            code: self.code.clone(),
            exchange: self.exchange.clone(),
            bars: Arc::clone(&self.bars),
            open: base_field(&self.open, "OPEN"),
            high: base_field(&self.high, "HIGH"),
            low: base_field(&self.low, "LOW"),
            close: base_field(&self.close, "CLOSE"),
            volume: base_field(&self.volume, "VOLUME"),
            sync: None,
        }
    }

    fn physical_times(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn is_synchronized(&self) -> bool {
        self.sync.is_some()
    }

    pub fn synchronizer(&self) -> Option<&Arc<Synchronizer>> {
        self.sync.as_ref()
    }
}

impl Identifiable for Bars {
    fn id(&self) -> &Identity {
        &self.id
    }
}

/// Sorted set of every date present in any of the collections.
pub fn build_unified_timeline<'a>(
    collections: impl IntoIterator<Item = &'a Bars>,
) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = collections
        .into_iter()
        .flat_map(|bars| bars.times())
        .collect();
    unique_dates.into_iter().collect()
}

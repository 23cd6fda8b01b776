//! Explicitly owned engine state.
//!
//! An [`Engine`] owns the bar, synchronizer and series caches plus one
//! maintenance thread per cache. Everything that needs a cache gets it from
//! here; there is no process-wide instance. Dropping the engine stops and
//! joins the maintenance threads.

use crate::domain::cache::{Builder, Cache, CacheStats};
use crate::domain::cache_config::CacheConfig;
use crate::domain::error::Result;
use crate::domain::graph::SeriesGraph;
use crate::domain::identity::{Identifiable, Identity};
use crate::domain::loader;
use crate::domain::maintenance::Maintainer;
use crate::domain::ohlcv::{Bars, build_unified_timeline};
use crate::domain::series::Series;
use crate::domain::synchronizer::Synchronizer;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub data: CacheStats,
    pub synchronizers: CacheStats,
    pub series: CacheStats,
}

/// Builds the synchronizer for one (reference axis, secondary) pair.
struct SyncBuilder<'a> {
    axis_id: &'a Identity,
    axis: &'a [NaiveDate],
    secondary: &'a Bars,
}

impl Builder<Synchronizer> for SyncBuilder<'_> {
    fn id(&self) -> Identity {
        Identity::derive("SYNC", &[self.axis_id, self.secondary.base_id()])
    }

    fn make(&self) -> Result<Synchronizer> {
        let secondary = self.secondary.unsynchronized();
        Synchronizer::create(self.axis_id, self.axis, secondary.id(), &secondary.times())
    }

    fn is_consistent(&self, existing: &Synchronizer) -> bool {
        existing.size() == self.axis.len()
    }
}

pub struct Engine {
    data: Arc<Cache<Bars>>,
    syncs: Arc<Cache<Synchronizer>>,
    graph: SeriesGraph,
    // Dropped with the engine, which stops the threads.
    _maintainers: Vec<Maintainer>,
}

impl Engine {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let data = Arc::new(Cache::new("data", config.data_cache_size));
        let syncs = Arc::new(Cache::new("sync", config.data_cache_size));
        let series = Arc::new(Cache::<Series>::new("series", config.series_cache_size));

        let interval = config.maintenance_interval;
        let maintainers = vec![
            Maintainer::spawn(&data, interval)?,
            Maintainer::spawn(&syncs, interval)?,
            Maintainer::spawn(&series, interval)?,
        ];

        let engine = Self {
            data,
            syncs,
            graph: SeriesGraph::new(series),
            _maintainers: maintainers,
        };
        engine.set_enabled(config.enabled);
        info!(
            enabled = config.enabled,
            series_size = config.series_cache_size,
            data_size = config.data_cache_size,
            ?interval,
            "engine started"
        );
        Ok(engine)
    }

    /// Bars for `code` on `exchange` in `[start, end]`, loaded once per
    /// distinct request.
    pub fn load_bars(
        &self,
        data: &dyn DataPort,
        code: &str,
        exchange: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<Bars>> {
        loader::load_bars(&self.data, data, code, exchange, start, end)
    }

    /// `secondary` viewed on `reference`'s time axis. The synchronizer is
    /// built once per pair and shared by every view of it.
    pub fn synchronize(&self, secondary: &Bars, reference: &Bars) -> Result<Bars> {
        self.synchronize_to_axis(secondary, reference.id(), &reference.times())
    }

    /// `secondary` viewed on the union of every reference's dates. With a
    /// single reference this is [`Engine::synchronize`]; with none the
    /// collection is returned as is.
    pub fn synchronize_to_union(
        &self,
        secondary: &Bars,
        references: &[Arc<Bars>],
    ) -> Result<Bars> {
        match references {
            [] => Ok(secondary.clone()),
            [reference] => self.synchronize(secondary, reference),
            _ => {
                let ids: Vec<&Identity> = references.iter().map(|r| r.id()).collect();
                let axis_id = Identity::derive("UNION", &ids);
                let axis = build_unified_timeline(references.iter().map(Arc::as_ref));
                debug!(%axis_id, dates = axis.len(), "built union axis");
                self.synchronize_to_axis(secondary, &axis_id, &axis)
            }
        }
    }

    fn synchronize_to_axis(
        &self,
        secondary: &Bars,
        axis_id: &Identity,
        axis: &[NaiveDate],
    ) -> Result<Bars> {
        let sync = self.syncs.find_and_add(&SyncBuilder {
            axis_id,
            axis,
            secondary,
        })?;
        Ok(secondary.synchronized_with(sync))
    }

    pub fn graph(&self) -> &SeriesGraph {
        &self.graph
    }

    pub fn data_cache(&self) -> &Arc<Cache<Bars>> {
        &self.data
    }

    pub fn sync_cache(&self) -> &Arc<Cache<Synchronizer>> {
        &self.syncs
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.data.enable(enabled);
        self.syncs.enable(enabled);
        self.graph.cache().enable(enabled);
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            data: self.data.stats(),
            synchronizers: self.syncs.stats(),
            series: self.graph.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bars(code: &str, days: &[u32]) -> Bars {
        Bars::with_id(
            Identity::new(code),
            code,
            "ASX",
            days.iter()
                .map(|&d| OhlcvBar {
                    date: day(d),
                    open: d as f64,
                    high: d as f64,
                    low: d as f64,
                    close: d as f64,
                    volume: 1,
                })
                .collect(),
        )
    }

    fn engine() -> Engine {
        Engine::new(&CacheConfig {
            maintenance_interval: Duration::from_secs(60),
            ..CacheConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn synchronizer_is_shared_per_pair() {
        let engine = engine();
        let reference = bars("IDX", &[1, 2, 3, 4]);
        let secondary = bars("BHP", &[1, 3]);

        let a = engine.synchronize(&secondary, &reference).unwrap();
        let b = engine.synchronize(&secondary, &reference).unwrap();

        assert!(Arc::ptr_eq(
            a.synchronizer().unwrap(),
            b.synchronizer().unwrap()
        ));
        assert_eq!(a.id(), b.id());
        assert_eq!(a.close_series().to_vec().unwrap(), vec![1.0, 1.0, 3.0, 3.0]);
        assert_eq!(engine.stats().synchronizers.misses, 1);
    }

    #[test]
    fn resynchronizing_a_view_keys_on_physical_collection() {
        let engine = engine();
        let reference = bars("IDX", &[1, 2, 3]);
        let secondary = bars("BHP", &[1, 2, 3]);

        let view = engine.synchronize(&secondary, &reference).unwrap();
        let again = engine.synchronize(&view, &reference).unwrap();

        assert_eq!(view.id(), again.id());
        assert_eq!(engine.sync_cache().len(), 1);
    }

    #[test]
    fn indicators_on_synchronized_views_are_cached() {
        let engine = engine();
        let reference = bars("IDX", &[1, 2, 3, 4]);
        let secondary = bars("BHP", &[1, 3]);
        let view = engine.synchronize(&secondary, &reference).unwrap();

        let first = engine.graph().sma(view.close_series(), 2).unwrap();
        let again = engine.synchronize(&secondary, &reference).unwrap();
        let second = engine.graph().sma(again.close_series(), 2).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.to_vec().unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn union_axis_covers_every_reference_date() {
        let engine = engine();
        let a = Arc::new(bars("A", &[1, 3]));
        let b = Arc::new(bars("B", &[2, 4]));
        let secondary = bars("BHP", &[1, 2]);

        let view = engine
            .synchronize_to_union(&secondary, &[Arc::clone(&a), Arc::clone(&b)])
            .unwrap();

        assert_eq!(view.times(), vec![day(1), day(2), day(3), day(4)]);
        assert_eq!(view.close_series().to_vec().unwrap(), vec![1.0, 2.0, 2.0, 2.0]);
        assert!(view.id().as_str().contains("SYNC[UNION[A,B],BHP]"));

        engine.synchronize_to_union(&secondary, &[a, b]).unwrap();
        assert_eq!(engine.stats().synchronizers.misses, 1);
    }

    #[test]
    fn union_of_one_reference_is_plain_synchronize() {
        let engine = engine();
        let reference = Arc::new(bars("IDX", &[1, 2, 3]));
        let secondary = bars("BHP", &[1, 3]);

        let via_union = engine
            .synchronize_to_union(&secondary, &[Arc::clone(&reference)])
            .unwrap();
        let direct = engine.synchronize(&secondary, &reference).unwrap();

        assert_eq!(via_union.id(), direct.id());
        assert_eq!(engine.sync_cache().len(), 1);
        assert_eq!(
            engine.synchronize_to_union(&secondary, &[]).unwrap().id(),
            secondary.id()
        );
    }

    #[test]
    fn disabled_engine_caches_nothing() {
        let engine = Engine::new(&CacheConfig {
            enabled: false,
            maintenance_interval: Duration::from_secs(60),
            ..CacheConfig::default()
        })
        .unwrap();
        let reference = bars("IDX", &[1, 2]);
        let secondary = bars("BHP", &[1, 2]);

        engine.synchronize(&secondary, &reference).unwrap();
        engine.graph().sma(secondary.close_series(), 1).unwrap();

        assert!(engine.sync_cache().is_empty());
        assert!(engine.graph().cache().is_empty());
        assert_eq!(engine.stats().series.uncached, 1);
    }
}

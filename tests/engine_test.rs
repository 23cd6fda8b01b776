//! End-to-end engine behaviour: loading, synchronization and derived series.

mod common;

use approx::assert_relative_eq;
use common::*;
use simtrader::domain::cache_config::CacheConfig;
use simtrader::domain::engine::Engine;
use simtrader::domain::error::SimtraderError;
use simtrader::domain::identity::Identifiable;
use std::sync::Arc;
use std::time::Duration;

fn engine() -> Engine {
    Engine::new(&CacheConfig {
        maintenance_interval: Duration::from_secs(60),
        ..CacheConfig::default()
    })
    .unwrap()
}

/// Ten consecutive days for IDX; BHP is missing the 3rd and the 7th.
fn gapped_data() -> MockDataPort {
    let idx = generate_bars("2024-01-01", 10, 1000.0);
    let bhp: Vec<OhlcvBar> = generate_bars("2024-01-01", 10, 100.0)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != 2 && *i != 6)
        .map(|(_, b)| b)
        .collect();
    MockDataPort::new()
        .with_bars("IDX", idx)
        .with_bars("BHP", bhp)
}

fn january() -> (chrono::NaiveDate, chrono::NaiveDate) {
    (date(2024, 1, 1), date(2024, 1, 31))
}

mod loading {
    use super::*;

    #[test]
    fn bars_are_fetched_once_per_request() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();

        let first = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let second = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(data.fetch_count(), 1);
        assert_eq!(first.size(), 10);
        assert_eq!(first.code(), "IDX");
    }

    #[test]
    fn unknown_symbol_is_no_data() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();

        let err = engine.load_bars(&data, "XYZ", "ASX", start, end).unwrap_err();

        assert_eq!(
            err,
            SimtraderError::NoData {
                code: "XYZ".into(),
                exchange: "ASX".into()
            }
        );
        assert!(engine.data_cache().is_empty());
    }

    #[test]
    fn fetch_errors_propagate_unchanged() {
        let engine = engine();
        let data = gapped_data().with_error("BAD", "disk on fire");
        let (start, end) = january();

        let err = engine.load_bars(&data, "BAD", "ASX", start, end).unwrap_err();

        assert_eq!(
            err,
            SimtraderError::Data {
                reason: "disk on fire".into()
            }
        );
        assert!(engine.data_cache().is_empty());
    }

    #[test]
    fn disabled_engine_fetches_every_time() {
        let engine = engine();
        engine.set_enabled(false);
        let data = gapped_data();
        let (start, end) = january();

        let first = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let second = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(data.fetch_count(), 2);
        assert_eq!(engine.stats().data.uncached, 2);
    }
}

mod synchronization {
    use super::*;

    #[test]
    fn gaps_are_forward_filled_on_reference_axis() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let bhp = engine.load_bars(&data, "BHP", "ASX", start, end).unwrap();

        let synced = engine.synchronize(&bhp, &idx).unwrap();

        assert_eq!(bhp.size(), 8);
        assert_eq!(synced.size(), 10);
        assert!(synced.synchronizer().unwrap().modified());
        assert_eq!(
            synced.close_series().to_vec().unwrap(),
            vec![100.0, 101.0, 101.0, 103.0, 104.0, 105.0, 105.0, 107.0, 108.0, 109.0]
        );
        assert_eq!(synced.time(2).unwrap(), date(2024, 1, 3));
        assert_eq!(synced.bar(2).unwrap().date, date(2024, 1, 2));
        assert!(synced.close_series().shares_storage(bhp.close_series()));
    }

    #[test]
    fn reads_past_the_axis_fail_with_logical_size() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let bhp = engine.load_bars(&data, "BHP", "ASX", start, end).unwrap();
        let synced = engine.synchronize(&bhp, &idx).unwrap();

        assert_eq!(
            synced.close(10),
            Err(SimtraderError::IndexOutOfRange { index: 10, size: 10 })
        );
        assert_eq!(
            synced.close_series().get(10),
            Err(SimtraderError::IndexOutOfRange { index: 10, size: 10 })
        );
    }

    #[test]
    fn synchronized_series_are_read_only() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let bhp = engine.load_bars(&data, "BHP", "ASX", start, end).unwrap();
        let synced = engine.synchronize(&bhp, &idx).unwrap();

        let mut close = synced.close_series().clone();
        assert!(matches!(
            close.set(0, 1.0),
            Err(SimtraderError::DisallowedMutation { .. })
        ));
    }

    #[test]
    fn arithmetic_needs_a_common_axis() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let bhp = engine.load_bars(&data, "BHP", "ASX", start, end).unwrap();

        let err = engine
            .graph()
            .div(bhp.close_series(), idx.close_series())
            .unwrap_err();
        assert_eq!(
            err,
            SimtraderError::OperationOnUnequalSizeSeries { left: 8, right: 10 }
        );

        let synced = engine.synchronize(&bhp, &idx).unwrap();
        let ratio = engine
            .graph()
            .div(synced.close_series(), idx.close_series())
            .unwrap();
        assert_eq!(ratio.len(), 10);
        assert_relative_eq!(ratio.get(2).unwrap(), 101.0 / 1002.0);
    }
}

mod derived_series {
    use super::*;

    #[test]
    fn indicator_graph_is_shared_and_deterministic() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let graph = engine.graph();

        let fast = graph.sma(idx.close_series(), 3).unwrap();
        let slow = graph.sma(idx.close_series(), 5).unwrap();
        let spread = graph.sub(&fast, &slow).unwrap();
        let again = graph
            .sub(
                &graph.sma(idx.close_series(), 3).unwrap(),
                &graph.sma(idx.close_series(), 5).unwrap(),
            )
            .unwrap();

        assert!(Arc::ptr_eq(&spread, &again));
        assert_eq!(
            spread.id().as_str(),
            "SUB[SMA(3)[CLOSE[BARS(IDX,ASX,2024-01-01,2024-01-31)]],\
             SMA(5)[CLOSE[BARS(IDX,ASX,2024-01-01,2024-01-31)]]]"
        );
        // Closes rise by 1 a day, so SMA(3) - SMA(5) settles at 1.
        assert_relative_eq!(spread.get(9).unwrap(), 1.0);
        assert_eq!(engine.stats().series.misses, 3);
    }

    #[test]
    fn indicators_on_synchronized_bars() {
        let engine = engine();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();
        let bhp = engine.load_bars(&data, "BHP", "ASX", start, end).unwrap();
        let synced = engine.synchronize(&bhp, &idx).unwrap();

        let highest = engine.graph().highest(synced.close_series(), 2).unwrap();
        let typical = engine.graph().typical_price(&synced).unwrap();

        assert_eq!(highest.len(), 10);
        assert_relative_eq!(highest.get(2).unwrap(), 101.0);
        assert_eq!(typical.len(), 10);
        assert_relative_eq!(typical.get(6).unwrap(), typical.get(5).unwrap());
    }

    #[test]
    fn released_results_can_be_reclaimed() {
        let engine = Engine::new(&CacheConfig {
            series_cache_size: 1,
            maintenance_interval: Duration::from_secs(60),
            ..CacheConfig::default()
        })
        .unwrap();
        let data = gapped_data();
        let (start, end) = january();
        let idx = engine.load_bars(&data, "IDX", "ASX", start, end).unwrap();

        let kept = engine.graph().sma(idx.close_series(), 2).unwrap();
        drop(engine.graph().sma(idx.close_series(), 3).unwrap());
        drop(engine.graph().sma(idx.close_series(), 4).unwrap());

        let cache = engine.graph().cache();
        while cache.len() > 1 && cache.maintain().is_some() {}

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(kept.id()));
    }
}

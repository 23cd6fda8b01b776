//! Core engine: identities, caches, series, synchronization and indicators.

pub mod cache;
pub mod cache_config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod identity;
pub mod indicator;
pub mod loader;
pub mod maintenance;
pub mod ohlcv;
pub mod series;
pub mod synchronizer;

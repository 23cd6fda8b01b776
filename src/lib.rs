//! Backtesting engine core: cached series, synchronized bar collections and indicators.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].
//!
//! Derived series are nodes of a computation graph keyed by content-derived
//! identities and memoized in thread-safe caches; bar collections can be
//! read through another collection's time axis without copying.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

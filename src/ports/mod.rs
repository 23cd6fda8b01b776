//! Port traits: the boundary between the engine and its data sources.

pub mod config_port;
pub mod data_port;

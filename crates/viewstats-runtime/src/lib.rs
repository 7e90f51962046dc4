//! Runtime layer for viewstats.
//!
//! Owns everything stateful around the pure pipeline: table sources, the
//! TTL fetch cache, and the periodic refresh orchestrator that feeds a
//! presentation layer with immutable snapshots.

pub mod orchestrator;
pub mod source;
pub mod table_cache;

pub use viewstats_core as core;
pub use viewstats_data as data;

//! Core domain layer for viewstats.
//!
//! Defines the data model (raw tables, samples, derived statistics), the
//! query types, the lenient cell parsers, the error taxonomy, and the CLI
//! settings. Contains no I/O beyond saved-query persistence.

pub mod cells;
pub mod error;
pub mod formatting;
pub mod models;
pub mod query;
pub mod settings;

//! vecprobe engine: everything a vector-search recall benchmark needs that
//! does not touch a database.
//!
//! - [`vecs`]: fvecs/ivecs reader and writer
//! - [`query`]: per-dialect KNN statement templates
//! - [`recall`]: per-query scoring
//! - [`stats`]: running recall / latency accumulator
//! - [`config`]: layered scenario configuration
//!
//! Database I/O, progress output and the command line live in the
//! `vecprobe-bench` crate.

pub mod config;
pub mod error;
pub mod query;
pub mod recall;
pub mod stats;
pub mod vecs;

pub use self::config::{BenchConfig, LogFormat, LogLevel, ProgressMode};
pub use error::{BenchError, Result};
pub use query::{
    Backend, Dialect, IndexTables, QueryBuilder, QueryOptions, ResolvedIndex, Statement,
};
pub use recall::{positional_score, RecallMetric};
pub use stats::{RunSummary, RunningStats, Snapshot};
pub use vecs::{IndexVector, Vector};

//! vecprobe benchmark library
//!
//! Measures recall and QPS of approximate KNN queries served by a SQL
//! database's vector index, against precomputed ground truth.
//!
//! # Architecture
//!
//! ```text
//! bench
//! ├── client/       # SqlConnection trait, MatrixOne and Postgres drivers, catalog lookups
//! ├── metrics/      # Progress sinks and the final reporter
//! └── runner/       # Query executor and the benchmark loop
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vecprobe_bench::{create_progress, BenchmarkRunner, UrlProvider};
//! use vecprobe_engine::BenchConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BenchConfig::load(Some("scenario.yaml"))?;
//!     config.validate()?;
//!     let provider = Arc::new(UrlProvider::new(config.connection.url.clone()));
//!     let progress = create_progress(config.run.progress);
//!     let summary = BenchmarkRunner::new(config, provider, progress).run().await?;
//!     println!("recall {:.4}", summary.mean_recall);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod metrics;
pub mod runner;

pub use client::{ConnectionProvider, Row, SqlConnection, SqlValue, UrlProvider};
pub use metrics::{create_progress, ProgressSink, RecordingProgress, ResultsReporter};
pub use runner::{BenchmarkRunner, Dataset, Phase, QueryExecutor, QueryResult};

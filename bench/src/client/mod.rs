//! Database connections
//!
//! The runner only needs "execute SQL, return rows". Each backend driver sits
//! behind [`SqlConnection`]; [`ConnectionProvider`] hands out connections for
//! a backend and database name.

use async_trait::async_trait;
use vecprobe_engine::{Backend, BenchError, Result};

pub mod catalog;
#[cfg(feature = "matrixone")]
pub mod matrixone;
#[cfg(feature = "postgres")]
pub mod postgres;

/// One column value, reduced to what the benchmark reads.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Integer view. Text is parsed since text-protocol drivers return
    /// numbers as strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub type Row = Vec<SqlValue>;

/// A live session with one database.
#[async_trait]
pub trait SqlConnection: Send {
    /// Run a statement and discard any result.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Run a statement and return every row, fully materialized.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Source of connections for the runner.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self, backend: Backend, database: &str) -> Result<Box<dyn SqlConnection>>;
}

/// Opens driver connections from a URL.
#[derive(Debug, Clone)]
pub struct UrlProvider {
    url: String,
}

impl UrlProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ConnectionProvider for UrlProvider {
    async fn connect(&self, backend: Backend, database: &str) -> Result<Box<dyn SqlConnection>> {
        tracing::debug!(%backend, database, "opening connection");
        match backend {
            #[cfg(feature = "matrixone")]
            Backend::MatrixOne => Ok(Box::new(
                matrixone::MatrixOneConnection::connect(&self.url, database).await?,
            )),
            #[cfg(feature = "postgres")]
            Backend::Postgres => Ok(Box::new(
                postgres::PostgresConnection::connect(&self.url, database).await?,
            )),
            #[allow(unreachable_patterns)]
            other => Err(BenchError::Connection(format!(
                "backend {other} is not compiled in; rebuild with the '{other}' feature"
            ))),
        }
    }
}

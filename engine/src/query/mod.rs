//! KNN statement templates
//!
//! Turns a query vector plus a [`QueryOptions`] into the SQL text a backend
//! understands. Three query shapes exist, one per [`Dialect`]:
//!
//! - `BruteForce`: exact distance scan over the source table.
//! - `IvfMultiStage`: IVF-flat through the index's centroid and entry
//!   secondary tables (MatrixOne). Needs a [`ResolvedIndex`].
//! - `IvfNative`: one statement using the backend's own ANN operator, preceded
//!   by a session statement that sets the probe count (pgvector).
//!
//! Building is pure: no I/O happens here. Physical index table names and the
//! current index version are looked up by the runner and handed in.

mod builder;
mod literal;

pub use builder::{catalog_lookup_sql, index_version_sql, QueryBuilder};
pub use literal::{quote_ident, quote_str, vector_literal};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Database product family. Decides wire protocol and SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MatrixOne over the MySQL wire protocol.
    #[default]
    #[serde(rename = "matrixone", alias = "mysql")]
    MatrixOne,
    /// PostgreSQL with the pgvector extension.
    #[serde(rename = "postgres", alias = "postgresql")]
    Postgres,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::MatrixOne => "matrixone",
            Backend::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "matrixone" | "mo" | "mysql" => Ok(Backend::MatrixOne),
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            _ => Err(BenchError::config(format!(
                "unknown backend '{s}': expected matrixone or postgres"
            ))),
        }
    }
}

/// Query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    BruteForce,
    #[default]
    IvfMultiStage,
    IvfNative,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::BruteForce => "brute_force",
            Dialect::IvfMultiStage => "ivf_multi_stage",
            Dialect::IvfNative => "ivf_native",
        }
    }

    /// Whether `backend` can run this query shape.
    pub fn supports(&self, backend: Backend) -> bool {
        match self {
            Dialect::BruteForce => true,
            Dialect::IvfMultiStage => backend == Backend::MatrixOne,
            Dialect::IvfNative => backend == Backend::Postgres,
        }
    }

    /// Multi-stage queries address the index's physical tables directly.
    pub fn needs_index_tables(&self) -> bool {
        matches!(self, Dialect::IvfMultiStage)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "brute_force" | "bruteforce" | "exact" => Ok(Dialect::BruteForce),
            "ivf_multi_stage" | "multi_stage" | "ivfflat" => Ok(Dialect::IvfMultiStage),
            "ivf_native" | "native" => Ok(Dialect::IvfNative),
            _ => Err(BenchError::config(format!(
                "unknown dialect '{s}': expected brute_force, ivf_multi_stage or ivf_native"
            ))),
        }
    }
}

/// Physical secondary tables backing one IVF-flat index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct IndexTables {
    pub metadata: String,
    pub centroids: String,
    pub entries: String,
}

/// Index tables plus the centroid generation currently in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIndex {
    pub tables: IndexTables,
    pub version: i64,
}

/// How to address the benchmark table and its index. Fixed for a run.
///
/// `k` and `probes` are copied into statement text as given; zero or negative
/// values reach the database unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    /// Database (schema) holding the source table
    pub database: String,

    /// Source table with the vector column
    pub table: String,

    /// Indexed vector column
    pub vector_column: String,

    /// Column projected as the result identifier
    pub id_column: String,

    /// Primary-key column referenced by the index entries table
    pub pk_column: String,

    /// Logical index name, used for the catalog lookup
    pub index_name: String,

    /// Centroids / lists probed per query
    pub probes: i64,

    /// Neighbors returned per query
    pub k: i64,

    /// Wrap the query vector in the backend's L2 normalization function
    pub normalize: bool,

    pub dialect: Dialect,

    /// Skip the catalog lookup and use these physical tables
    pub index_tables: Option<IndexTables>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            database: "a".to_string(),
            table: "t1".to_string(),
            vector_column: "b".to_string(),
            id_column: "a".to_string(),
            pk_column: "__mo_fake_pk_col".to_string(),
            index_name: "idx1".to_string(),
            probes: 5,
            k: 10,
            normalize: true,
            dialect: Dialect::IvfMultiStage,
            index_tables: None,
        }
    }
}

impl QueryOptions {
    /// `k` clamped to a usable length for client-side truncation.
    pub fn k_len(&self) -> usize {
        self.k.max(0) as usize
    }
}

/// SQL for one query: session setup (untimed) followed by the timed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub setup: Vec<String>,
    pub query: String,
}

impl Statement {
    pub fn single(query: String) -> Self {
        Self {
            setup: Vec::new(),
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_backend_matrix() {
        assert!(Dialect::BruteForce.supports(Backend::MatrixOne));
        assert!(Dialect::BruteForce.supports(Backend::Postgres));
        assert!(Dialect::IvfMultiStage.supports(Backend::MatrixOne));
        assert!(!Dialect::IvfMultiStage.supports(Backend::Postgres));
        assert!(Dialect::IvfNative.supports(Backend::Postgres));
        assert!(!Dialect::IvfNative.supports(Backend::MatrixOne));
    }

    #[test]
    fn parse_names() {
        assert_eq!("ivf-native".parse::<Dialect>().unwrap(), Dialect::IvfNative);
        assert_eq!("mysql".parse::<Backend>().unwrap(), Backend::MatrixOne);
        assert!("oracle".parse::<Backend>().is_err());
    }

    #[test]
    fn k_len_clamps_negative() {
        let options = QueryOptions {
            k: -4,
            ..QueryOptions::default()
        };
        assert_eq!(options.k_len(), 0);
    }
}

//! Error taxonomy shared by the codec, the statement builder and the runner.
//!
//! Every variant is fatal for a benchmark run. Nothing in this crate retries.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Bad dataset selection, mismatched file lengths, invalid options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed vecs file: negative dimension, truncated record, bad range.
    #[error("decode error in {path} at byte {offset}: {reason}")]
    Decode {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    /// Open/seek/read failure on a dataset file.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Database unreachable or handshake failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Statement rejected by the server or result rows that cannot be decoded.
    #[error("query failed: {reason} (sql: {sql})")]
    Query { sql: String, reason: String },
}

impl BenchError {
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::Configuration(msg.into())
    }

    pub fn query(sql: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BenchError::Query {
            sql: sql.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(path: &std::path::Path, offset: u64, reason: impl Into<String>) -> Self {
        BenchError::Decode {
            path: path.to_path_buf(),
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short tag logged as `error.kind` when a run aborts.
    pub fn kind(&self) -> &'static str {
        match self {
            BenchError::Configuration(_) => "configuration",
            BenchError::Decode { .. } => "decode",
            BenchError::Io { .. } => "io",
            BenchError::Connection(_) => "connection",
            BenchError::Query { .. } => "query",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_file_and_offset() {
        let err =
            BenchError::decode(std::path::Path::new("/data/q.fvecs"), 516, "truncated record");
        let msg = err.to_string();
        assert!(msg.contains("/data/q.fvecs"));
        assert!(msg.contains("516"));
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn query_error_keeps_statement_text() {
        let err = BenchError::query("SELECT 1", "syntax error");
        assert!(err.to_string().contains("SELECT 1"));
        assert_eq!(err.kind(), "query");
    }
}

use std::time::{Duration, Instant};

use vecprobe_engine::{BenchError, Result, Statement};

use crate::client::{Row, SqlConnection};

/// Ids returned for one query and the client-observed latency.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<i64>,
    pub elapsed: Duration,
}

/// Runs built statements and times them.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    expected_rows: usize,
}

impl QueryExecutor {
    /// `expected_rows` is k; shorter results are logged but still scored.
    pub fn new(expected_rows: usize) -> Self {
        Self { expected_rows }
    }

    /// Run `statement.setup` untimed, then time the query from submission
    /// until every row has been read and decoded.
    pub async fn execute(
        &self,
        conn: &mut dyn SqlConnection,
        statement: &Statement,
    ) -> Result<QueryResult> {
        for setup in &statement.setup {
            conn.execute(setup).await?;
        }

        tracing::debug!(sql = %statement.query, "executing knn query");
        let start = Instant::now();
        let rows = conn.query(&statement.query).await?;
        let ids = decode_ids(&statement.query, &rows)?;
        let elapsed = start.elapsed();

        if ids.len() < self.expected_rows {
            tracing::warn!(
                returned = ids.len(),
                expected = self.expected_rows,
                "query returned fewer rows than k"
            );
        }

        Ok(QueryResult { ids, elapsed })
    }
}

/// First column of every row as an integer id, in server order.
fn decode_ids(sql: &str, rows: &[Row]) -> Result<Vec<i64>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let value = row
                .first()
                .ok_or_else(|| BenchError::query(sql, format!("row {i} has no columns")))?;
            value.as_i64().ok_or_else(|| {
                BenchError::query(sql, format!("row {i}: id column is not an integer: {value:?}"))
            })
        })
        .collect()
}

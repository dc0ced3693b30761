//! Index table lookups issued before the measured queries.

use vecprobe_engine::query::{catalog_lookup_sql, index_version_sql};
use vecprobe_engine::{BenchError, IndexTables, QueryOptions, ResolvedIndex, Result};

use super::SqlConnection;

/// Physical tables and version for the configured index, or `None` when the
/// dialect does not address index tables directly.
///
/// An explicit `options.index_tables` skips the catalog query; the version is
/// always read from the metadata table.
pub async fn resolve_index(
    conn: &mut dyn SqlConnection,
    options: &QueryOptions,
) -> Result<Option<ResolvedIndex>> {
    if !options.dialect.needs_index_tables() {
        return Ok(None);
    }

    let tables = match &options.index_tables {
        Some(tables) => tables.clone(),
        None => lookup_index_tables(conn, options).await?,
    };
    let version = current_index_version(conn, options, &tables.metadata).await?;

    tracing::info!(
        index = %options.index_name,
        metadata = %tables.metadata,
        centroids = %tables.centroids,
        entries = %tables.entries,
        version,
        "resolved index tables"
    );
    Ok(Some(ResolvedIndex { tables, version }))
}

/// Read the metadata/centroids/entries table names from the catalog.
pub async fn lookup_index_tables(
    conn: &mut dyn SqlConnection,
    options: &QueryOptions,
) -> Result<IndexTables> {
    let sql = catalog_lookup_sql(options);
    let rows = conn.query(&sql).await?;

    let mut metadata = None;
    let mut centroids = None;
    let mut entries = None;
    for row in &rows {
        let (Some(kind), Some(name)) = (
            row.first().and_then(|v| v.as_str()),
            row.get(1).and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        match kind {
            "metadata" => metadata = Some(name.to_string()),
            "centroids" => centroids = Some(name.to_string()),
            "entries" => entries = Some(name.to_string()),
            _ => {}
        }
    }

    match (metadata, centroids, entries) {
        (Some(metadata), Some(centroids), Some(entries)) => Ok(IndexTables {
            metadata,
            centroids,
            entries,
        }),
        (metadata, centroids, entries) => {
            let missing: Vec<&str> = [
                ("metadata", metadata.is_none()),
                ("centroids", centroids.is_none()),
                ("entries", entries.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            Err(BenchError::config(format!(
                "index '{}' on column '{}' is missing {} table(s) in the catalog",
                options.index_name,
                options.vector_column,
                missing.join(", ")
            )))
        }
    }
}

/// Current centroid generation recorded in the index metadata table.
pub async fn current_index_version(
    conn: &mut dyn SqlConnection,
    options: &QueryOptions,
    metadata_table: &str,
) -> Result<i64> {
    let sql = index_version_sql(options, metadata_table);
    let rows = conn.query(&sql).await?;
    rows.first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_i64())
        .ok_or_else(|| BenchError::query(sql, "index metadata has no integer 'version' row"))
}

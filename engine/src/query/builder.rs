use super::literal::{quote_ident, quote_str, vector_literal};
use super::{Backend, Dialect, QueryOptions, ResolvedIndex, Statement};
use crate::error::{BenchError, Result};

// MatrixOne IVF-flat secondary table columns
const CENTROID_ID_COL: &str = "__mo_index_centroid_id";
const CENTROID_VERSION_COL: &str = "__mo_index_centroid_version";
const CENTROID_VECTOR_COL: &str = "__mo_index_centroid";
const ENTRY_PK_COL: &str = "__mo_index_pri_col";
const ENTRY_VERSION_COL: &str = "__mo_index_centroid_fk_version";
const ENTRY_CENTROID_COL: &str = "__mo_index_centroid_fk_id";
const METADATA_KEY_COL: &str = "__mo_index_key";
const METADATA_VAL_COL: &str = "__mo_index_val";

/// Builds statements for one benchmark scenario.
///
/// Validates the dialect/backend pairing once; [`QueryBuilder::build`] is then
/// infallible and allocation is the only cost per query.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    options: QueryOptions,
    backend: Backend,
    shape: Shape,
}

#[derive(Debug, Clone)]
enum Shape {
    BruteForce,
    MultiStage(ResolvedIndex),
    Native,
}

impl QueryBuilder {
    pub fn new(
        options: QueryOptions,
        backend: Backend,
        index: Option<ResolvedIndex>,
    ) -> Result<Self> {
        if !options.dialect.supports(backend) {
            return Err(BenchError::config(format!(
                "dialect {} is not available on backend {}",
                options.dialect, backend
            )));
        }
        let shape = match (options.dialect, index) {
            (Dialect::BruteForce, _) => Shape::BruteForce,
            (Dialect::IvfNative, _) => Shape::Native,
            (Dialect::IvfMultiStage, Some(index)) => Shape::MultiStage(index),
            (Dialect::IvfMultiStage, None) => {
                return Err(BenchError::config(format!(
                    "dialect {} needs resolved index tables for index '{}'",
                    options.dialect, options.index_name
                )))
            }
        };
        Ok(Self {
            options,
            backend,
            shape,
        })
    }

    pub fn build(&self, vector: &[f32]) -> Statement {
        let literal = vector_literal(vector);
        match &self.shape {
            Shape::BruteForce => self.brute_force(&literal),
            Shape::MultiStage(index) => self.multi_stage(&literal, index),
            Shape::Native => self.native(&literal),
        }
    }

    fn ident(&self, name: &str) -> String {
        quote_ident(self.backend, name)
    }

    /// `db`.`table` on MatrixOne; Postgres addresses the connected database.
    fn table_ref(&self, table: &str) -> String {
        match self.backend {
            Backend::MatrixOne => format!(
                "{}.{}",
                self.ident(&self.options.database),
                self.ident(table)
            ),
            Backend::Postgres => self.ident(table),
        }
    }

    /// The literal as a distance argument, normalized when requested.
    fn vector_arg(&self, literal: &str, normalize: bool) -> String {
        let quoted = quote_str(self.backend, literal);
        match (self.backend, normalize) {
            (Backend::MatrixOne, true) => format!("normalize_l2({quoted})"),
            (Backend::Postgres, true) => format!("l2_normalize({quoted}::vector)"),
            (_, false) => quoted,
        }
    }

    fn distance(&self, column: &str, arg: &str) -> String {
        match self.backend {
            Backend::MatrixOne => format!("l2_distance({column}, {arg})"),
            Backend::Postgres => format!("{column} <-> {arg}"),
        }
    }

    fn brute_force(&self, literal: &str) -> Statement {
        let o = &self.options;
        let order = self.distance(
            &self.ident(&o.vector_column),
            &self.vector_arg(literal, o.normalize),
        );
        let query = format!(
            "SELECT {} FROM {} ORDER BY {} ASC LIMIT {}",
            self.ident(&o.id_column),
            self.table_ref(&o.table),
            order,
            o.k
        );
        match self.backend {
            // keep the planner off any ANN index so the scan stays exact
            Backend::Postgres => Statement {
                setup: vec!["SET enable_indexscan = off".to_string()],
                query,
            },
            Backend::MatrixOne => Statement::single(query),
        }
    }

    /// Nearest centroids -> candidate pks -> exact re-rank on the source table.
    fn multi_stage(&self, literal: &str, index: &ResolvedIndex) -> Statement {
        let o = &self.options;
        let version = index.version;

        let centroids = format!(
            "SELECT {} FROM {} WHERE {} = {} ORDER BY {} ASC LIMIT {}",
            self.ident(CENTROID_ID_COL),
            self.table_ref(&index.tables.centroids),
            self.ident(CENTROID_VERSION_COL),
            version,
            self.distance(&self.ident(CENTROID_VECTOR_COL), &self.vector_arg(literal, o.normalize)),
            o.probes
        );

        let candidates = format!(
            "SELECT DISTINCT({}) FROM {} WHERE {} = {} AND {} IN ({})",
            self.ident(ENTRY_PK_COL),
            self.table_ref(&index.tables.entries),
            self.ident(ENTRY_VERSION_COL),
            version,
            self.ident(ENTRY_CENTROID_COL),
            centroids
        );

        let query = format!(
            "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {} ASC LIMIT {}",
            self.ident(&o.id_column),
            self.table_ref(&o.table),
            self.ident(&o.pk_column),
            candidates,
            self.distance(&self.ident(&o.vector_column), &self.vector_arg(literal, false)),
            o.k
        );
        Statement::single(query)
    }

    fn native(&self, literal: &str) -> Statement {
        let o = &self.options;
        let query = format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT {}",
            self.ident(&o.id_column),
            self.table_ref(&o.table),
            self.distance(&self.ident(&o.vector_column), &self.vector_arg(literal, o.normalize)),
            o.k
        );
        Statement {
            setup: vec![format!("SET ivfflat.probes = {}", o.probes)],
            query,
        }
    }
}

/// Catalog query returning `(algo_table_type, index_table_name)` rows for the
/// index on `options.vector_column`.
pub fn catalog_lookup_sql(options: &QueryOptions) -> String {
    let b = Backend::MatrixOne;
    format!(
        "SELECT algo_table_type, index_table_name FROM mo_catalog.mo_indexes WHERE name = {} AND column_name = {}",
        quote_str(b, &options.index_name),
        quote_str(b, &options.vector_column)
    )
}

/// Single-row query for the index's current centroid version.
pub fn index_version_sql(options: &QueryOptions, metadata_table: &str) -> String {
    let b = Backend::MatrixOne;
    format!(
        "SELECT CAST({} AS BIGINT) FROM {}.{} WHERE {} = 'version'",
        quote_ident(b, METADATA_VAL_COL),
        quote_ident(b, &options.database),
        quote_ident(b, metadata_table),
        quote_ident(b, METADATA_KEY_COL)
    )
}

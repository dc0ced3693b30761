//! Generated statements must parse as SQL in the target dialect.
//!
//! pgvector's `<->` operator is not understood by the parser, so Postgres
//! coverage is limited to the session statements.

use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use vecprobe_engine::query::{catalog_lookup_sql, index_version_sql};
use vecprobe_engine::{Backend, Dialect, IndexTables, QueryBuilder, QueryOptions, ResolvedIndex};

const VECTOR: [f32; 4] = [0.25, -1.0, 3.5, 1e-7];

fn resolved() -> ResolvedIndex {
    ResolvedIndex {
        tables: IndexTables {
            metadata: "__mo_index_secondary_0190a1b2-meta".to_string(),
            centroids: "__mo_index_secondary_0190a1b2-centroids".to_string(),
            entries: "__mo_index_secondary_0190a1b2-entries".to_string(),
        },
        version: 3,
    }
}

fn assert_mysql(sql: &str) {
    if let Err(e) = Parser::parse_sql(&MySqlDialect {}, sql) {
        panic!("{sql}\n  does not parse: {e}");
    }
}

#[test]
fn matrixone_brute_force_parses() {
    for normalize in [true, false] {
        let options = QueryOptions {
            dialect: Dialect::BruteForce,
            normalize,
            ..QueryOptions::default()
        };
        let builder = QueryBuilder::new(options, Backend::MatrixOne, None).unwrap();
        let stmt = builder.build(&VECTOR);
        assert!(stmt.setup.is_empty());
        assert_mysql(&stmt.query);
    }
}

#[test]
fn matrixone_multi_stage_parses() {
    for normalize in [true, false] {
        let options = QueryOptions {
            normalize,
            ..QueryOptions::default()
        };
        let builder = QueryBuilder::new(options, Backend::MatrixOne, Some(resolved())).unwrap();
        assert_mysql(&builder.build(&VECTOR).query);
    }
}

#[test]
fn catalog_helpers_parse() {
    let options = QueryOptions {
        index_name: "idx'1".to_string(),
        ..QueryOptions::default()
    };
    assert_mysql(&catalog_lookup_sql(&options));
    assert_mysql(&index_version_sql(&options, &resolved().tables.metadata));
}

#[test]
fn postgres_session_statements_parse() {
    let dialects = [Dialect::BruteForce, Dialect::IvfNative];
    for dialect in dialects {
        let options = QueryOptions {
            dialect,
            ..QueryOptions::default()
        };
        let builder = QueryBuilder::new(options, Backend::Postgres, None).unwrap();
        let stmt = builder.build(&VECTOR);
        assert_eq!(stmt.setup.len(), 1);
        for setup in &stmt.setup {
            Parser::parse_sql(&PostgreSqlDialect {}, setup)
                .unwrap_or_else(|e| panic!("{setup}: {e}"));
        }
    }
}

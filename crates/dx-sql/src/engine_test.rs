use super::*;

fn transpile(sql: &str, source: Dialect, target: Dialect) -> SqlResult<String> {
    SqlparserEngine::new().transpile(sql, source, target, false)
}

#[test]
fn test_simple_select_mysql_to_postgres() {
    let out = transpile(
        "SELECT id, name FROM users WHERE status = 'active'",
        Dialect::MySql,
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(out, "SELECT id, name FROM users WHERE status = 'active'");
    // Output must parse in the target dialect
    parse(&out, Dialect::Postgres).unwrap();
}

#[test]
fn test_no_trailing_terminator() {
    let out = transpile("SELECT 1; SELECT 2;", Dialect::Postgres, Dialect::MySql).unwrap();
    assert_eq!(out, "SELECT 1;\nSELECT 2");
}

#[test]
fn test_pretty_output_spans_lines() {
    let out = SqlparserEngine::new()
        .transpile(
            "SELECT a, b FROM t WHERE a = 1",
            Dialect::Postgres,
            Dialect::Snowflake,
            true,
        )
        .unwrap();
    assert!(out.contains('\n'), "got: {}", out);
    assert!(out.starts_with("SELECT"), "got: {}", out);
}

#[test]
fn test_rewrites_applied_across_dialects() {
    let out = transpile(
        "SELECT NVL(bonus, 0), SYSDATE FROM emp",
        Dialect::Oracle,
        Dialect::Postgres,
    )
    .unwrap();
    assert!(out.contains("COALESCE(bonus, 0)"), "got: {}", out);
    assert!(out.contains("CURRENT_DATE"), "got: {}", out);
}

#[test]
fn test_same_dialect_renders_without_rewrites() {
    let out = transpile("SELECT NVL(a, 1) FROM dual", Dialect::Oracle, Dialect::Oracle).unwrap();
    assert!(out.contains("NVL(a, 1)"), "got: {}", out);
}

#[test]
fn test_parse_failure_is_distinguished() {
    let err = transpile("SELEC id FROM users", Dialect::MySql, Dialect::Postgres).unwrap_err();
    assert!(err.is_parse_failure(), "got: {}", err);

    let err = transpile("   ", Dialect::MySql, Dialect::Postgres).unwrap_err();
    assert_eq!(err, SqlError::EmptySql);
}

#[test]
fn test_full_outer_join_unsupported_for_mysql() {
    let err = transpile(
        "SELECT * FROM a FULL OUTER JOIN b ON a.id = b.id",
        Dialect::Postgres,
        Dialect::MySql,
    )
    .unwrap_err();
    match err {
        SqlError::UnsupportedFeature { feature, from, to } => {
            assert_eq!(feature, "FULL OUTER JOIN");
            assert_eq!(from, "postgres");
            assert_eq!(to, "mysql");
        }
        other => panic!("Expected UnsupportedFeature, got: {:?}", other),
    }
}

#[test]
fn test_ilike_unsupported_for_sqlite() {
    let err = transpile(
        "SELECT * FROM t WHERE name ILIKE 'a%'",
        Dialect::Postgres,
        Dialect::Sqlite,
    )
    .unwrap_err();
    assert!(!err.is_parse_failure());
    assert!(err.to_string().contains("ILIKE"), "got: {}", err);
}

#[test]
fn test_unsupported_feature_ignores_literals() {
    assert_eq!(
        unsupported_feature("SELECT 'a FULL JOIN b', \"limit\" FROM t", Dialect::MySql),
        None
    );
    assert_eq!(unsupported_feature("SELECT a FROM t LIMIT 5", Dialect::TSql), Some("LIMIT"));
    assert_eq!(
        unsupported_feature("SELECT TOP 5 a FROM t", Dialect::Postgres),
        Some("SELECT TOP")
    );
    assert_eq!(
        unsupported_feature("SELECT id FROM emp CONNECT BY PRIOR id = mgr", Dialect::Snowflake),
        None
    );
}

#[test]
fn test_engine_is_object_safe() {
    let engine: Box<dyn RuleEngine> = Box::new(SqlparserEngine::new());
    assert_eq!(engine.name(), "sqlparser");
}

use super::*;

const PROCEDURE: &str = "CREATE OR REPLACE PROCEDURE p_load_orders(p_day IN VARCHAR2, p_rows OUT NUMBER) IS
  v_count NUMBER(10, 2) := 0;
  v_name VARCHAR2(100);
BEGIN
  SELECT COUNT(*) INTO v_count FROM orders WHERE day = p_day;
  p_rows := v_count;
END p_load_orders;";

#[test]
fn test_parse_procedure_parts() {
    let proc = OracleProcedure::parse(PROCEDURE).unwrap();
    assert!(proc.or_replace);
    assert_eq!(proc.name, "p_load_orders");
    assert_eq!(proc.params.len(), 2);
    assert_eq!(proc.params[0].mode, Some("IN"));
    assert_eq!(proc.params[0].data_type, "VARCHAR");
    assert_eq!(proc.params[1].mode, Some("OUT"));
    assert_eq!(proc.params[1].data_type, "NUMERIC");
    assert!(
        proc.declarations.contains("v_count NUMERIC(10, 2) := 0;"),
        "got: {}",
        proc.declarations
    );
    assert!(proc.declarations.contains("v_name VARCHAR(100);"), "got: {}", proc.declarations);
    assert!(proc.body.starts_with("SELECT COUNT(*)"), "got: {}", proc.body);
    assert!(proc.body.ends_with("p_rows := v_count;"), "got: {}", proc.body);
}

#[test]
fn test_render_plpgsql() {
    let proc = OracleProcedure::parse(PROCEDURE).unwrap();
    let out = proc.render_plpgsql("  SELECT 1;  ");
    let expected = "CREATE OR REPLACE PROCEDURE p_load_orders(IN p_day VARCHAR, OUT p_rows NUMERIC)
LANGUAGE plpgsql
AS $$
DECLARE
v_count NUMERIC(10, 2) := 0;
  v_name VARCHAR(100);
BEGIN
SELECT 1;
END;
$$;";
    assert_eq!(out, expected);
}

#[test]
fn test_procedure_without_params_or_declarations() {
    let proc = OracleProcedure::parse("CREATE PROCEDURE p_test AS\nBEGIN\n  NULL;\nEND;").unwrap();
    assert!(!proc.or_replace);
    assert!(proc.params.is_empty());
    assert!(proc.declarations.is_empty());
    let out = proc.render_plpgsql(&proc.body);
    assert!(
        out.starts_with("CREATE PROCEDURE p_test()\nLANGUAGE plpgsql\nAS $$\nBEGIN\nNULL;\nEND;\n$$;"),
        "got: {}",
        out
    );
    assert!(!out.contains("DECLARE"));
}

#[test]
fn test_in_out_and_default_params() {
    let proc = OracleProcedure::parse(
        "CREATE PROCEDURE p(a IN OUT NOCOPY CLOB, b PLS_INTEGER DEFAULT 5, c IN DATE := SYSDATE) IS BEGIN NULL; END p;",
    )
    .unwrap();
    let rendered: Vec<String> = proc.params.iter().map(ProcedureParam::render).collect();
    assert_eq!(
        rendered,
        vec!["INOUT a TEXT", "b INTEGER DEFAULT 5", "IN c DATE DEFAULT SYSDATE"]
    );
}

#[test]
fn test_mismatched_end_name_is_parse_failure() {
    let err = OracleProcedure::parse("CREATE PROCEDURE p_a IS BEGIN NULL; END p_b;").unwrap_err();
    assert!(err.is_parse_failure(), "got: {}", err);
    assert!(err.to_string().contains("p_b"), "got: {}", err);
}

#[test]
fn test_schema_qualified_name_matches_end() {
    let proc = OracleProcedure::parse("CREATE PROCEDURE etl.p_a IS BEGIN NULL; END p_a;").unwrap();
    assert_eq!(proc.name, "etl.p_a");
}

#[test]
fn test_non_procedure_rejected() {
    for text in [
        "SELECT 1 FROM dual;",
        "BEGIN NULL; END;",
        "CREATE FUNCTION f RETURN NUMBER IS BEGIN RETURN 1; END f;",
    ] {
        let err = OracleProcedure::parse(text).unwrap_err();
        assert!(err.is_parse_failure(), "{:?} gave {}", text, err);
    }
}

#[test]
fn test_body_with_dollar_quotes_uses_tagged_quote() {
    let proc = OracleProcedure::parse("CREATE PROCEDURE p IS BEGIN NULL; END;").unwrap();
    let out = proc.render_plpgsql("PERFORM 'a$$b';");
    assert!(out.contains("AS $body$\n"), "got: {}", out);
    assert!(out.ends_with("$body$;"), "got: {}", out);
}

#[test]
fn test_map_types_skips_literals() {
    assert_eq!(
        map_types("v NUMBER := 'NUMBER'; -- RAW\nw RAW(16);"),
        "v NUMERIC := 'NUMBER'; -- RAW\nw BYTEA(16);"
    );
}

#[test]
fn test_structural_rewrite_pairs() {
    assert!(supports_structural_rewrite(Dialect::Oracle, Dialect::Postgres));
    assert!(supports_structural_rewrite(Dialect::Oracle, Dialect::Redshift));
    assert!(!supports_structural_rewrite(Dialect::Oracle, Dialect::MySql));
    assert!(!supports_structural_rewrite(Dialect::Postgres, Dialect::Postgres));
}

#[test]
fn test_procedure_pattern_compiles() {
    let re = procedure_regex().unwrap();
    assert!(re.is_match(PROCEDURE));
    assert!(!re.is_match("SELECT 1;"));
}

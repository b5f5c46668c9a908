use super::*;

#[test]
fn test_appends_terminator() {
    assert_eq!(preprocess("SELECT 1"), "SELECT 1;");
    assert_eq!(preprocess("SELECT 1\n"), "SELECT 1;\n");
}

#[test]
fn test_existing_terminator_kept() {
    assert_eq!(preprocess("SELECT 1;\n"), "SELECT 1;\n");
}

#[test]
fn test_no_terminator_after_comment() {
    let sql = "SELECT 1;\n-- trailing note";
    assert_eq!(preprocess(sql), sql);
    let sql = "SELECT 1;\n/* done */";
    assert_eq!(preprocess(sql), sql);
}

#[test]
fn test_no_terminator_after_slash_line() {
    let sql = "BEGIN\n  NULL;\nEND;\n/";
    assert_eq!(ensure_terminator(sql), sql);
}

#[test]
fn test_no_terminator_inside_open_literal() {
    let sql = "SELECT 'unclosed";
    assert_eq!(ensure_terminator(sql), sql);
}

#[test]
fn test_terminator_after_literal_with_semicolon() {
    assert_eq!(ensure_terminator("SELECT 'a;'"), "SELECT 'a;';");
}

#[test]
fn test_blank_line_runs_collapse() {
    let sql = "SELECT 1;\n\n\n\nSELECT 2;\n";
    assert_eq!(preprocess(sql), "SELECT 1;\n\nSELECT 2;\n");
}

#[test]
fn test_single_blank_line_kept() {
    let sql = "SELECT 1;\n\nSELECT 2;";
    assert_eq!(collapse_blank_lines(sql), sql);
}

#[test]
fn test_trailing_whitespace_trimmed() {
    assert_eq!(trim_line_ends("SELECT 1;   \nSELECT 2;\t\n"), "SELECT 1;\nSELECT 2;\n");
    assert_eq!(trim_line_ends("SELECT 1;  \r\n"), "SELECT 1;\r\n");
}

#[test]
fn test_multiline_literal_untouched() {
    let sql = "INSERT INTO t VALUES ('line one   \n\n\n\nline five');";
    assert_eq!(preprocess(sql), sql);
}

#[test]
fn test_line_comment_trailing_space_trimmed() {
    assert_eq!(trim_line_ends("-- note   \nSELECT 1;"), "-- note\nSELECT 1;");
}

#[test]
fn test_empty_text() {
    assert_eq!(preprocess(""), "");
    assert_eq!(preprocess("\n\n"), "\n");
}

#[test]
fn test_harmonize_adds_missing_terminator() {
    assert_eq!(harmonize_terminator("SELECT 1", "SELECT 1;"), "SELECT 1;");
    assert_eq!(harmonize_terminator("  SELECT 1\n", "select 1 ;"), "SELECT 1;");
}

#[test]
fn test_harmonize_drops_extra_terminator() {
    assert_eq!(harmonize_terminator("SELECT 1;", "SELECT 1"), "SELECT 1");
    assert_eq!(
        harmonize_terminator("SELECT 1; -- note", "SELECT 1"),
        "SELECT 1 -- note"
    );
}

#[test]
fn test_harmonize_after_line_comment() {
    assert_eq!(
        harmonize_terminator("SELECT 1 -- note", "SELECT 1;"),
        "SELECT 1 -- note\n;"
    );
}

#[test]
fn test_harmonize_ignores_terminator_in_literal() {
    assert_eq!(harmonize_terminator("SELECT ';'", "SELECT ';';"), "SELECT ';';");
    assert!(!ends_with_terminator("SELECT 1 -- done;"));
    assert!(ends_with_terminator("SELECT 1; -- done"));
}

#[test]
fn test_harmonize_dollar_body() {
    let converted = "CREATE FUNCTION f() RETURNS int AS $$ SELECT 1; $$ LANGUAGE sql;";
    assert_eq!(harmonize_terminator(converted, "CREATE FUNCTION f ...;"), converted);
}

use super::*;
use proptest::prelude::*;

fn matcher() -> RegionMatcher {
    RegionMatcher::new(&["ZTC_SQLZZ"]).unwrap()
}

fn unit_kinds(seg: &Segmentation) -> Vec<RegionKind> {
    seg.units().map(|r| r.kind).collect()
}

#[test]
fn test_plain_statement_is_single_unit() {
    let doc = "SELECT id, name FROM users WHERE status = 'active'";
    let seg = matcher().segment(doc);
    assert!(!seg.whole_document);
    assert_eq!(unit_kinds(&seg), vec![RegionKind::Plain]);
    assert_eq!(seg.reconstruct(doc), doc);
}

#[test]
fn test_whole_document_procedure() {
    let doc = "\nCREATE OR REPLACE PROCEDURE p IS\n  v NUMBER;\nBEGIN\n  IF v > 0 THEN\n    NULL;\n  END IF;\nEND p;\n";
    let seg = matcher().segment(doc);
    assert!(seg.whole_document);
    let units: Vec<&Region> = seg.units().collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].kind, RegionKind::ProceduralBlock);
    assert_eq!(units[0].text, doc.trim());
    assert_eq!(seg.reconstruct(doc), doc);
}

#[test]
fn test_mixed_document_layout() {
    let doc = "-- header\nSELECT 1 FROM dual;\n\nZTC_SQLZZ('INSERT INTO t VALUES (''x'')');\n/* ZTC_SQLZZ('DELETE FROM t'); */\nBEGIN\n  NULL;\nEND;\n\nSELECT 2 FROM dual;\n";
    let m = matcher();

    let regions = m.match_regions(doc);
    let kinds: Vec<RegionKind> = regions.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RegionKind::DynamicCall,
            RegionKind::CommentBlock,
            RegionKind::ProceduralBlock
        ]
    );

    let seg = m.segment(doc);
    assert_eq!(
        unit_kinds(&seg),
        vec![
            RegionKind::Plain,
            RegionKind::DynamicCall,
            RegionKind::CommentBlock,
            RegionKind::ProceduralBlock,
            RegionKind::Plain
        ]
    );
    let texts: Vec<&str> = seg.units().map(|r| r.text.as_str()).collect();
    assert_eq!(texts[0], "SELECT 1 FROM dual;");
    assert_eq!(texts[3], "BEGIN\n  NULL;\nEND;");
    assert_eq!(texts[4], "SELECT 2 FROM dual;");
    assert!(matches!(seg.pieces[0], Piece::Verbatim { start: 0, end: 10 }));
    assert_eq!(seg.reconstruct(doc), doc);
}

#[test]
fn test_keywords_inside_literals_and_comments_ignored() {
    let doc = "SELECT 'BEGIN' FROM t; -- BEGIN\nSELECT 'END;' FROM u;";
    assert!(matcher().match_regions(doc).is_empty());
}

#[test]
fn test_transaction_begin_is_not_a_block() {
    let doc = "BEGIN;\nUPDATE t SET x = 1;\nCOMMIT;\nBEGIN TRANSACTION;\nCOMMIT;";
    assert!(matcher().match_regions(doc).is_empty());
}

#[test]
fn test_case_expression_inside_block() {
    let doc = "BEGIN\n  x := CASE WHEN a THEN 1 ELSE 2 END;\n  y := 3;\nEND;";
    let regions = matcher().match_regions(doc);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].text, doc);
}

#[test]
fn test_control_flow_ends_do_not_close_block() {
    let doc = "DECLARE\n  i NUMBER := 0;\nBEGIN\n  LOOP\n    EXIT WHEN i > 3;\n  END LOOP;\n  WHILE i < 5 LOOP i := i + 1; END LOOP;\nEND;";
    assert_eq!(matcher().whole_document_block(doc), Some(0..doc.len()));
}

#[test]
fn test_nested_blocks_with_name() {
    let doc = "CREATE PROCEDURE p AS\nBEGIN\n  BEGIN\n    NULL;\n  END;\nEND p;";
    let seg = matcher().segment(doc);
    assert!(seg.whole_document);
}

#[test]
fn test_dollar_quoted_function_ends_at_top_level_semicolon() {
    let doc = "CREATE FUNCTION f() RETURNS int AS $$ BEGIN RETURN 1; END; $$ LANGUAGE plpgsql;\nSELECT f();";
    let regions = matcher().match_regions(doc);
    assert_eq!(regions.len(), 1);
    assert!(regions[0].text.ends_with("LANGUAGE plpgsql;"));
    let seg = matcher().segment(doc);
    assert_eq!(
        unit_kinds(&seg),
        vec![RegionKind::ProceduralBlock, RegionKind::Plain]
    );
}

#[test]
fn test_unterminated_block_is_plain() {
    let doc = "BEGIN\n  NULL;\n";
    let m = matcher();
    assert!(m.match_regions(doc).is_empty());
    assert_eq!(unit_kinds(&m.segment(doc)), vec![RegionKind::Plain]);
}

#[test]
fn test_dynamic_call_inside_block_is_absorbed() {
    let doc = "BEGIN\n  ZTC_SQLZZ('SELECT 1 FROM dual');\nEND;";
    let regions = matcher().match_regions(doc);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, RegionKind::ProceduralBlock);
}

#[test]
fn test_tsql_declare_variable_is_not_a_block() {
    let doc = "DECLARE @x INT;\nSELECT @x;";
    assert!(matcher().match_regions(doc).is_empty());
}

#[test]
fn test_block_without_semicolon_ends_at_end_keyword() {
    let doc = "BEGIN\n  SELECT 1;\nEND\nSELECT 2;";
    let seg = matcher().segment(doc);
    let texts: Vec<&str> = seg.units().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["BEGIN\n  SELECT 1;\nEND", "SELECT 2;"]);
}

#[test]
fn test_sqlplus_slash_is_verbatim() {
    let doc = "BEGIN\n  NULL;\nEND;\n/\n";
    let seg = matcher().segment(doc);
    assert!(!seg.whole_document);
    assert_eq!(unit_kinds(&seg), vec![RegionKind::ProceduralBlock]);
    assert_eq!(seg.reconstruct(doc), doc);
}

#[test]
fn test_multiline_literal_keeps_batch_together() {
    let doc = "SELECT 'a\n\n-- not a comment\nb' FROM t;";
    let seg = matcher().segment(doc);
    assert_eq!(unit_kinds(&seg), vec![RegionKind::Plain]);
    assert_eq!(seg.units().next().unwrap().text, doc);
}

#[test]
fn test_blank_lines_split_batches() {
    let doc = "SELECT 1;\n\n-- two\nSELECT 2;\nSELECT 3;";
    let seg = matcher().segment(doc);
    let texts: Vec<&str> = seg.units().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["SELECT 1;", "SELECT 2;\nSELECT 3;"]);
}

#[test]
fn test_parse_dynamic_call_unescapes_and_rebuilds() {
    let m = matcher();
    let text = "ZTC_SQLZZ( 'SELECT ''a'' FROM t' );";
    let call = m.parse_dynamic_call(text).unwrap();
    assert_eq!(call.prefix, "ZTC_SQLZZ( '");
    assert_eq!(call.inner, "SELECT 'a' FROM t");
    assert_eq!(call.suffix, "' );");
    assert_eq!(
        call.rebuild("SELECT 'b' FROM t"),
        "ZTC_SQLZZ( 'SELECT ''b'' FROM t' );"
    );
}

#[test]
fn test_wrapper_match_is_case_insensitive() {
    let regions = matcher().match_regions("ztc_sqlzz('select 1');");
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, RegionKind::DynamicCall);
}

#[test]
fn test_dynamic_calls_in_comment_text() {
    let text = "/* note ZTC_SQLZZ('DELETE FROM t'); done */";
    let spans = matcher().dynamic_calls_in(text);
    assert_eq!(spans.len(), 1);
    assert_eq!(&text[spans[0].clone()], "ZTC_SQLZZ('DELETE FROM t');");
}

#[test]
fn test_no_wrappers_means_no_dynamic_calls() {
    let m = RegionMatcher::new::<&str>(&[]).unwrap();
    assert!(m.match_regions("ZTC_SQLZZ('SELECT 1');").is_empty());
    assert!(m.parse_dynamic_call("ZTC_SQLZZ('SELECT 1');").is_none());
}

#[test]
fn test_invalid_wrapper_rejected() {
    let err = RegionMatcher::new(&["bad(name"]).unwrap_err();
    assert!(matches!(err, CoreError::InvalidWrapperName { .. }));
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SELECT a FROM t;".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just("-- c\n".to_string()),
        Just("/* x */".to_string()),
        Just("/* open".to_string()),
        Just("BEGIN\n NULL;\nEND;".to_string()),
        Just("ZTC_SQLZZ('SELECT ''1''');".to_string()),
        Just("'str".to_string()),
        Just("CREATE PROCEDURE p IS BEGIN NULL; END p;".to_string()),
        Just(" ".to_string()),
        Just("END;".to_string()),
        Just("CASE".to_string()),
        Just("$$ x $$".to_string()),
        Just("DECLARE v NUMBER;".to_string()),
        "\\PC{0,12}",
    ]
}

proptest! {
    #[test]
    fn prop_segmentation_reconstructs_document(parts in prop::collection::vec(fragment(), 0..12)) {
        let doc: String = parts.concat();
        let seg = matcher().segment(&doc);
        prop_assert_eq!(seg.reconstruct(&doc), doc.clone());

        let mut cursor = 0;
        for piece in &seg.pieces {
            let (start, end) = match piece {
                Piece::Verbatim { start, end } => (*start, *end),
                Piece::Unit(region) => {
                    prop_assert_eq!(&doc[region.span()], region.text.as_str());
                    (region.start, region.end)
                }
            };
            prop_assert_eq!(start, cursor);
            prop_assert!(end >= start);
            cursor = end;
        }
        prop_assert_eq!(cursor, doc.len());
    }

    #[test]
    fn prop_regions_ordered_and_disjoint(parts in prop::collection::vec(fragment(), 0..12)) {
        let doc: String = parts.concat();
        let regions = matcher().match_regions(&doc);
        for pair in regions.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
    }
}

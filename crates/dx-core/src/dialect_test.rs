use super::*;

#[test]
fn test_parse_canonical_names() {
    for dialect in Dialect::ALL {
        let parsed: Dialect = dialect.name().parse().unwrap();
        assert_eq!(parsed, dialect);
    }
}

#[test]
fn test_parse_aliases_case_insensitive() {
    assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::TSql);
    assert_eq!(" Oracle ".parse::<Dialect>().unwrap(), Dialect::Oracle);
}

#[test]
fn test_parse_unknown_is_validation_error() {
    let err = "cobol".parse::<Dialect>().unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedDialect { ref name } if name == "cobol"));
    assert!(err.to_string().contains("[C003]"));
}

#[test]
fn test_hard_pair_derivation() {
    assert!(Dialect::Postgres.lacks_procedural_features_of(Dialect::Oracle));
    assert!(Dialect::MySql.lacks_procedural_features_of(Dialect::TSql));
    assert!(Dialect::Sqlite.lacks_procedural_features_of(Dialect::Oracle));
    assert!(!Dialect::Redshift.lacks_procedural_features_of(Dialect::Postgres));
    // No procedural language on the source side means nothing to lose.
    assert!(!Dialect::Oracle.lacks_procedural_features_of(Dialect::Sqlite));
}

#[test]
fn test_serde_round_trip_uses_names() {
    let pair = DialectPair::new(Dialect::Oracle, Dialect::Postgres);
    let yaml = serde_yaml::to_string(&pair).unwrap();
    assert!(yaml.contains("source: oracle"), "got: {}", yaml);
    let back: DialectPair = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, pair);
}

#[test]
fn test_identifier_quotes() {
    assert_eq!(Dialect::MySql.identifier_quote(), '`');
    assert_eq!(Dialect::Postgres.identifier_quote(), '"');
    assert_eq!(Dialect::TSql.identifier_quote(), '[');
}

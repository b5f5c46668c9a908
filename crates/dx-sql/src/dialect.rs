//! Mapping from Dialectic dialects to sqlparser grammars

use dx_core::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    BigQueryDialect, ClickHouseDialect, DatabricksDialect, Dialect as ParserDialect,
    DuckDbDialect, GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// The sqlparser grammar used to read a dialect.
///
/// Dialects without a dedicated grammar parse with the generic one.
pub fn parser_dialect(dialect: Dialect) -> Box<dyn ParserDialect> {
    match dialect {
        Dialect::MySql | Dialect::Doris | Dialect::StarRocks => Box::new(MySqlDialect {}),
        Dialect::Postgres | Dialect::Materialize | Dialect::RisingWave => {
            Box::new(PostgreSqlDialect {})
        }
        Dialect::Redshift => Box::new(RedshiftSqlDialect {}),
        Dialect::Hive | Dialect::Spark | Dialect::Spark2 => Box::new(HiveDialect {}),
        Dialect::Databricks => Box::new(DatabricksDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Snowflake => Box::new(SnowflakeDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::ClickHouse => Box::new(ClickHouseDialect {}),
        Dialect::BigQuery => Box::new(BigQueryDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::Athena
        | Dialect::Presto
        | Dialect::Trino
        | Dialect::Dune
        | Dialect::Drill
        | Dialect::Druid
        | Dialect::Tableau
        | Dialect::Teradata
        | Dialect::Oracle => Box::new(GenericDialect {}),
    }
}

/// Parse SQL written in `dialect` into statements
pub fn parse(sql: &str, dialect: Dialect) -> SqlResult<Vec<Statement>> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(SqlError::EmptySql);
    }

    let grammar = parser_dialect(dialect);
    Parser::parse_sql(grammar.as_ref(), sql).map_err(|e| {
        let msg = e.to_string();
        let (line, column) = parse_location_from_error(&msg);
        SqlError::ParseFailure {
            message: msg,
            line,
            column,
        }
    })
}

/// Parse line and column from a sqlparser error message.
///
/// `ParserError` carries no structured location, so "Line: N, Column: M" is
/// read from the message text. Unknown locations are `(0, 0)`.
pub(crate) fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let number_after = |label: &str| -> Option<usize> {
        let start = msg.find(label)? + label.len();
        let digits: String = msg[start..]
            .chars()
            .skip_while(|c| c.is_whitespace())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    };
    match (number_after("Line:"), number_after("Column:")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;

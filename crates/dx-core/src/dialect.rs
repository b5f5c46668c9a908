//! Supported SQL dialects and their profiles

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A SQL dialect known to both conversion engines.
///
/// Unknown names are a validation error, never a conversion error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    Athena,
    BigQuery,
    ClickHouse,
    Databricks,
    Doris,
    Drill,
    Druid,
    DuckDb,
    Dune,
    Hive,
    Materialize,
    MySql,
    Oracle,
    Postgres,
    Presto,
    Redshift,
    RisingWave,
    Snowflake,
    Spark,
    Spark2,
    Sqlite,
    StarRocks,
    Tableau,
    Teradata,
    Trino,
    TSql,
}

/// Native procedural language of a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProceduralLanguage {
    /// Oracle PL/SQL
    PlSql,
    /// PostgreSQL PL/pgSQL
    PlPgSql,
    /// Transact-SQL
    TSql,
    /// SQL/PSM as implemented by MySQL-family engines
    SqlPsm,
    /// Snowflake Scripting
    SnowflakeScripting,
    /// BigQuery procedural language
    BigQueryScript,
}

impl Dialect {
    /// Every supported dialect, in display order.
    pub const ALL: [Dialect; 26] = [
        Dialect::Athena,
        Dialect::BigQuery,
        Dialect::ClickHouse,
        Dialect::Databricks,
        Dialect::Doris,
        Dialect::Drill,
        Dialect::Druid,
        Dialect::DuckDb,
        Dialect::Dune,
        Dialect::Hive,
        Dialect::Materialize,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::Postgres,
        Dialect::Presto,
        Dialect::Redshift,
        Dialect::RisingWave,
        Dialect::Snowflake,
        Dialect::Spark,
        Dialect::Spark2,
        Dialect::Sqlite,
        Dialect::StarRocks,
        Dialect::Tableau,
        Dialect::Teradata,
        Dialect::Trino,
        Dialect::TSql,
    ];

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Athena => "athena",
            Dialect::BigQuery => "bigquery",
            Dialect::ClickHouse => "clickhouse",
            Dialect::Databricks => "databricks",
            Dialect::Doris => "doris",
            Dialect::Drill => "drill",
            Dialect::Druid => "druid",
            Dialect::DuckDb => "duckdb",
            Dialect::Dune => "dune",
            Dialect::Hive => "hive",
            Dialect::Materialize => "materialize",
            Dialect::MySql => "mysql",
            Dialect::Oracle => "oracle",
            Dialect::Postgres => "postgres",
            Dialect::Presto => "presto",
            Dialect::Redshift => "redshift",
            Dialect::RisingWave => "risingwave",
            Dialect::Snowflake => "snowflake",
            Dialect::Spark => "spark",
            Dialect::Spark2 => "spark2",
            Dialect::Sqlite => "sqlite",
            Dialect::StarRocks => "starrocks",
            Dialect::Tableau => "tableau",
            Dialect::Teradata => "teradata",
            Dialect::Trino => "trino",
            Dialect::TSql => "tsql",
        }
    }

    /// Human-readable product name used in prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Dialect::Athena => "Amazon Athena",
            Dialect::BigQuery => "Google BigQuery",
            Dialect::ClickHouse => "ClickHouse",
            Dialect::Databricks => "Databricks SQL",
            Dialect::Doris => "Apache Doris",
            Dialect::Drill => "Apache Drill",
            Dialect::Druid => "Apache Druid",
            Dialect::DuckDb => "DuckDB",
            Dialect::Dune => "Dune SQL",
            Dialect::Hive => "Apache Hive",
            Dialect::Materialize => "Materialize",
            Dialect::MySql => "MySQL",
            Dialect::Oracle => "Oracle",
            Dialect::Postgres => "PostgreSQL",
            Dialect::Presto => "Presto",
            Dialect::Redshift => "Amazon Redshift",
            Dialect::RisingWave => "RisingWave",
            Dialect::Snowflake => "Snowflake",
            Dialect::Spark => "Spark SQL",
            Dialect::Spark2 => "Spark 2 SQL",
            Dialect::Sqlite => "SQLite",
            Dialect::StarRocks => "StarRocks",
            Dialect::Tableau => "Tableau",
            Dialect::Teradata => "Teradata",
            Dialect::Trino => "Trino",
            Dialect::TSql => "SQL Server (T-SQL)",
        }
    }

    /// Character used to quote identifiers.
    pub fn identifier_quote(self) -> char {
        match self {
            Dialect::MySql
            | Dialect::Doris
            | Dialect::StarRocks
            | Dialect::Hive
            | Dialect::Spark
            | Dialect::Spark2
            | Dialect::Databricks
            | Dialect::BigQuery => '`',
            Dialect::TSql => '[',
            _ => '"',
        }
    }

    /// Native procedural language, if the engine has one.
    pub fn procedural_language(self) -> Option<ProceduralLanguage> {
        match self {
            Dialect::Oracle => Some(ProceduralLanguage::PlSql),
            Dialect::Postgres | Dialect::Redshift => Some(ProceduralLanguage::PlPgSql),
            Dialect::TSql => Some(ProceduralLanguage::TSql),
            Dialect::MySql | Dialect::Doris | Dialect::StarRocks => {
                Some(ProceduralLanguage::SqlPsm)
            }
            Dialect::Snowflake => Some(ProceduralLanguage::SnowflakeScripting),
            Dialect::BigQuery => Some(ProceduralLanguage::BigQueryScript),
            _ => None,
        }
    }

    /// Whether the target cannot natively express the source's procedural code.
    pub fn lacks_procedural_features_of(self, source: Dialect) -> bool {
        match source.procedural_language() {
            None => false,
            Some(lang) => self.procedural_language() != Some(lang),
        }
    }

    /// Parse a dialect name, returning a validation error for unknown names.
    pub fn parse_name(name: &str) -> CoreResult<Self> {
        name.parse()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let canonical = match lowered.as_str() {
            "postgresql" | "pg" => "postgres",
            "mssql" | "sqlserver" | "sql_server" => "tsql",
            other => other,
        };
        Dialect::ALL
            .iter()
            .copied()
            .find(|d| d.name() == canonical)
            .ok_or_else(|| CoreError::UnsupportedDialect {
                name: s.to_string(),
            })
    }
}

impl Serialize for Dialect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered `(source, target)` dialect pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectPair {
    pub source: Dialect,
    pub target: Dialect,
}

impl DialectPair {
    pub fn new(source: Dialect, target: Dialect) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for DialectPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;

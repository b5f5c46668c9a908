//! Rule-based transpilation engine

use dx_core::lexer::{LexicalMask, Token};
use dx_core::Dialect;
use sqlparser::ast::Statement;

use crate::dialect::parse;
use crate::error::{SqlError, SqlResult};
use crate::rewrite::apply_rewrites;

/// Deterministic SQL-to-SQL conversion between dialects.
///
/// Implementations distinguish grammar rejection ([`SqlError::ParseFailure`])
/// from constructs the target cannot express
/// ([`SqlError::UnsupportedFeature`]); callers fall back silently only on the
/// former.
pub trait RuleEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Convert `sql` from `source` to `target`.
    ///
    /// The output carries no trailing statement terminator; statements are
    /// separated by `;` and a newline.
    fn transpile(&self, sql: &str, source: Dialect, target: Dialect, pretty: bool)
        -> SqlResult<String>;
}

/// [`RuleEngine`] backed by sqlparser grammars and AST rewrites
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlparserEngine;

impl SqlparserEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RuleEngine for SqlparserEngine {
    fn name(&self) -> &'static str {
        "sqlparser"
    }

    fn transpile(
        &self,
        sql: &str,
        source: Dialect,
        target: Dialect,
        pretty: bool,
    ) -> SqlResult<String> {
        let mut statements = parse(sql, source)?;

        if source != target {
            let applied = apply_rewrites(&mut statements, target);
            log::debug!(
                "Applied {} rewrite(s) to {} statement(s) for {}->{}",
                applied,
                statements.len(),
                source,
                target
            );
        }

        let rendered = render(&statements, pretty);

        if source != target {
            if let Some(feature) = unsupported_feature(&rendered, target) {
                return Err(SqlError::UnsupportedFeature {
                    feature: feature.to_string(),
                    from: source.to_string(),
                    to: target.to_string(),
                });
            }
        }

        Ok(rendered)
    }
}

/// Render statements, pretty-printed when asked
pub fn render(statements: &[Statement], pretty: bool) -> String {
    statements
        .iter()
        .map(|stmt| {
            if pretty {
                format!("{:#}", stmt)
            } else {
                stmt.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";\n")
}

fn lacks_ilike(target: Dialect) -> bool {
    matches!(
        target,
        Dialect::MySql
            | Dialect::Doris
            | Dialect::StarRocks
            | Dialect::Sqlite
            | Dialect::TSql
            | Dialect::Oracle
            | Dialect::BigQuery
            | Dialect::Hive
            | Dialect::Teradata
            | Dialect::Presto
            | Dialect::Trino
            | Dialect::Athena
    )
}

/// First construct in rendered `sql` that `target` has no syntax for.
pub fn unsupported_feature(sql: &str, target: Dialect) -> Option<&'static str> {
    let mask = LexicalMask::scan(sql);
    let tokens = mask.tokens(sql);
    let keyword_at = |i: usize, kw: &str| -> bool {
        tokens
            .get(i)
            .map(|t: &Token| t.is_keyword(sql, kw))
            .unwrap_or(false)
    };

    for i in 0..tokens.len() {
        if target == Dialect::MySql && keyword_at(i, "FULL") {
            let next = if keyword_at(i + 1, "OUTER") { i + 2 } else { i + 1 };
            if keyword_at(next, "JOIN") {
                return Some("FULL OUTER JOIN");
            }
        }
        if keyword_at(i, "ILIKE") && lacks_ilike(target) {
            return Some("ILIKE");
        }
        if keyword_at(i, "SELECT") && keyword_at(i + 1, "TOP") && target != Dialect::TSql {
            return Some("SELECT TOP");
        }
        if keyword_at(i, "LIMIT") && target == Dialect::TSql {
            return Some("LIMIT");
        }
        if keyword_at(i, "CONNECT")
            && keyword_at(i + 1, "BY")
            && !matches!(target, Dialect::Oracle | Dialect::Snowflake)
        {
            return Some("CONNECT BY");
        }
    }
    None
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

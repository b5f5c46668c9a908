//! Structural and dialect-specific checks on converted SQL
//!
//! Every check here is advisory: findings become warnings on the conversion
//! result and never turn a successful conversion into a failure.

use dx_core::lexer::{parentheses_balanced, LexicalMask, MaskKind};
use dx_core::Dialect;

/// Warnings for converted `sql` in the `target` dialect
pub fn validate_result(sql: &str, target: Dialect) -> Vec<String> {
    let mut warnings = Vec::new();

    if sql.trim().is_empty() {
        warnings.push("conversion produced empty output".to_string());
        return warnings;
    }

    let mask = LexicalMask::scan(sql);
    if !parentheses_balanced(sql, &mask) {
        warnings.push("unbalanced parentheses in output".to_string());
    }
    match mask.unterminated() {
        Some(MaskKind::StringLiteral) => {
            warnings.push("unterminated string literal in output".to_string())
        }
        Some(MaskKind::QuotedIdentifier) => {
            warnings.push("unterminated quoted identifier in output".to_string())
        }
        Some(MaskKind::BlockComment) => {
            warnings.push("unterminated block comment in output".to_string())
        }
        Some(MaskKind::DollarQuoted) => {
            warnings.push("unterminated dollar-quoted body in output".to_string())
        }
        Some(MaskKind::LineComment) | None => {}
    }

    warnings.extend(dialect_warnings(sql, &mask, target));
    warnings
}

fn dialect_warnings(sql: &str, mask: &LexicalMask, target: Dialect) -> Vec<String> {
    let code = mask.code_text(sql);
    let tokens = mask.tokens(sql);
    let has_word = |kw: &str| tokens.iter().any(|t| t.is_keyword(sql, kw));
    let mut warnings = Vec::new();

    match target {
        Dialect::Postgres | Dialect::Redshift | Dialect::Materialize | Dialect::RisingWave => {
            if has_word("SYSDATE") {
                warnings.push(format!(
                    "SYSDATE is not available in {}; use CURRENT_DATE or CURRENT_TIMESTAMP",
                    target.display_name()
                ));
            }
            if has_word("TO_DATE") && sql.to_ascii_uppercase().contains("'YYYYMMDD'") {
                warnings.push(
                    "TO_DATE with 'YYYYMMDD' is lenient in PostgreSQL; verify the input format"
                        .to_string(),
                );
            }
        }
        Dialect::Oracle => {
            if has_word("CURRENT_DATE") {
                warnings.push(
                    "CURRENT_DATE follows the session time zone in Oracle; SYSDATE may be intended"
                        .to_string(),
                );
            }
        }
        Dialect::MySql | Dialect::Doris | Dialect::StarRocks => {
            if code.contains("::") {
                warnings.push(format!(
                    "'::' casts are not supported by {}; use CAST(... AS ...)",
                    target.display_name()
                ));
            }
        }
        Dialect::TSql => {
            if has_word("LIMIT") {
                warnings.push(
                    "LIMIT is not supported by T-SQL; use TOP or OFFSET/FETCH".to_string(),
                );
            }
        }
        _ => {}
    }

    warnings
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;

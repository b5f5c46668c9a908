//! Dialect rewrite rules applied between parse and render
//!
//! Rules only fire when the source and target dialects differ; the engine
//! renders unchanged statements for a same-dialect conversion.

use dx_core::Dialect;
use sqlparser::ast::{
    visit_expressions_mut, visit_relations_mut, Expr, FunctionArguments, Ident, ObjectName,
    ObjectNamePart, Statement,
};
use std::ops::ControlFlow;

/// What a function call becomes in the target dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replacement {
    /// Same arguments, new name
    Function(&'static str),
    /// Niladic keyword such as `CURRENT_TIMESTAMP`
    Keyword(&'static str),
}

fn is_mysql_family(d: Dialect) -> bool {
    matches!(d, Dialect::MySql | Dialect::Doris | Dialect::StarRocks)
}

fn function_replacement(name: &str, argc: usize, target: Dialect) -> Option<Replacement> {
    let replacement = match (name, argc) {
        ("NVL", 2) if target != Dialect::Oracle => Replacement::Function("COALESCE"),
        ("IFNULL", 2) if !is_mysql_family(target) && target != Dialect::Sqlite => {
            Replacement::Function("COALESCE")
        }
        ("ISNULL", 2) if target != Dialect::TSql => Replacement::Function("COALESCE"),
        ("LEN", 1) if target != Dialect::TSql => Replacement::Function("LENGTH"),
        ("LENGTH", 1) if target == Dialect::TSql => Replacement::Function("LEN"),
        ("GETDATE", 0) if target != Dialect::TSql => Replacement::Keyword("CURRENT_TIMESTAMP"),
        ("NOW", 0) if target == Dialect::TSql => Replacement::Function("GETDATE"),
        ("NOW", 0) if target == Dialect::Oracle => Replacement::Keyword("SYSTIMESTAMP"),
        _ => return None,
    };
    Some(replacement)
}

fn keyword_replacement(name: &str, target: Dialect) -> Option<&'static str> {
    match name {
        "SYSDATE" if target != Dialect::Oracle => Some("CURRENT_DATE"),
        "SYSTIMESTAMP" if target != Dialect::Oracle => Some("CURRENT_TIMESTAMP"),
        _ => None,
    }
}

fn single_name(name: &ObjectName) -> Option<String> {
    match name.0.as_slice() {
        [ObjectNamePart::Identifier(ident)] if ident.quote_style.is_none() => {
            Some(ident.value.to_ascii_uppercase())
        }
        _ => None,
    }
}

fn bare_name(value: &str) -> ObjectName {
    ObjectName(vec![ObjectNamePart::Identifier(Ident::new(value))])
}

/// Rewrite function calls and delimited identifiers for `target`.
///
/// Returns the number of rewrites applied.
pub fn apply_rewrites(statements: &mut [Statement], target: Dialect) -> usize {
    let quote = target.identifier_quote();
    let mut applied = 0;

    for stmt in statements.iter_mut() {
        let _ = visit_expressions_mut(stmt, |expr: &mut Expr| {
            match expr {
                Expr::Function(func) => {
                    if let Some(name) = single_name(&func.name) {
                        let argc = match &func.args {
                            FunctionArguments::List(list) => list.args.len(),
                            FunctionArguments::None => 0,
                            _ => 1,
                        };
                        match function_replacement(&name, argc, target) {
                            Some(Replacement::Function(to)) => {
                                func.name = bare_name(to);
                                applied += 1;
                            }
                            Some(Replacement::Keyword(to)) => {
                                *expr = Expr::Identifier(Ident::new(to));
                                applied += 1;
                            }
                            None => {}
                        }
                    }
                }
                Expr::Identifier(ident) if ident.quote_style.is_none() => {
                    if let Some(to) = keyword_replacement(&ident.value.to_ascii_uppercase(), target)
                    {
                        *expr = Expr::Identifier(Ident::new(to));
                        applied += 1;
                    }
                }
                Expr::Identifier(ident) => applied += requote(ident, quote),
                Expr::CompoundIdentifier(idents) => {
                    for ident in idents.iter_mut() {
                        applied += requote(ident, quote);
                    }
                }
                _ => {}
            }
            ControlFlow::<()>::Continue(())
        });

        let _ = visit_relations_mut(stmt, |name: &mut ObjectName| {
            for part in name.0.iter_mut() {
                if let ObjectNamePart::Identifier(ident) = part {
                    applied += requote(ident, quote);
                }
            }
            ControlFlow::<()>::Continue(())
        });
    }

    applied
}

/// Delimited identifiers take the target's quote character
fn requote(ident: &mut Ident, quote: char) -> usize {
    match ident.quote_style {
        Some(q @ ('"' | '`' | '[')) if q != quote => {
            ident.quote_style = Some(quote);
            1
        }
        _ => 0,
    }
}

#[cfg(test)]
#[path = "rewrite_test.rs"]
mod tests;

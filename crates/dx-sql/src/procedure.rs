//! Structural rewrite of Oracle stored procedures into PL/pgSQL
//!
//! Only the procedure frame is rewritten here: header, parameter list,
//! declarations and the `LANGUAGE plpgsql AS $$ ... $$` wrapper. The body is
//! converted by the caller, which runs it back through the full pipeline.

use std::sync::OnceLock;

use dx_core::lexer::{LexicalMask, TokenKind};
use dx_core::{Dialect, ProceduralLanguage};
use regex::Regex;

use crate::error::{SqlError, SqlResult};

static PROCEDURE_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn procedure_regex() -> SqlResult<&'static Regex> {
    let compiled = PROCEDURE_RE.get_or_init(|| {
        Regex::new(concat!(
            r#"(?is)^\s*CREATE\s+(?P<replace>OR\s+REPLACE\s+)?PROCEDURE\s+"#,
            r#"(?P<name>[A-Za-z0-9_."$#]+)\s*"#,
            r#"(?P<params>\((?:[^()]|\([^()]*\))*\))?\s*"#,
            r#"(?:IS|AS)\b(?P<decls>.*?)\bBEGIN\b(?P<body>.*)"#,
            r#"\bEND(?:\s+(?P<end_name>[A-Za-z0-9_."$#]+))?\s*;\s*$"#,
        ))
    });
    compiled
        .as_ref()
        .map_err(|e| SqlError::Other(format!("procedure pattern failed to compile: {}", e)))
}

/// Whether a procedure can be moved between the two dialects structurally
pub fn supports_structural_rewrite(source: Dialect, target: Dialect) -> bool {
    source.procedural_language() == Some(ProceduralLanguage::PlSql)
        && target.procedural_language() == Some(ProceduralLanguage::PlPgSql)
}

/// A procedure parameter in PostgreSQL form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParam {
    pub name: String,
    /// `IN`, `OUT` or `INOUT`; `None` when Oracle left it implicit
    pub mode: Option<&'static str>,
    pub data_type: String,
    pub default: Option<String>,
}

impl ProcedureParam {
    fn parse(text: &str) -> SqlResult<Self> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some((name, rest)) = words.split_first() else {
            return Err(malformed("empty parameter"));
        };

        let mut rest = rest;
        let mut mode = None;
        let upper_at = |words: &[&str], i: usize| words.get(i).map(|w| w.to_ascii_uppercase());
        match upper_at(rest, 0).as_deref() {
            Some("IN") => {
                if upper_at(rest, 1).as_deref() == Some("OUT") {
                    mode = Some("INOUT");
                    rest = &rest[2..];
                } else {
                    mode = Some("IN");
                    rest = &rest[1..];
                }
            }
            Some("OUT") => {
                mode = Some("OUT");
                rest = &rest[1..];
            }
            _ => {}
        }
        if upper_at(rest, 0).as_deref() == Some("NOCOPY") {
            rest = &rest[1..];
        }

        let default_at = rest
            .iter()
            .position(|w| *w == ":=" || w.eq_ignore_ascii_case("DEFAULT"));
        let (type_words, default) = match default_at {
            Some(at) => (&rest[..at], Some(rest[at + 1..].join(" "))),
            None => (rest, None),
        };
        if type_words.is_empty() {
            return Err(malformed(&format!("parameter '{}' has no type", name)));
        }

        Ok(Self {
            name: name.to_string(),
            mode,
            data_type: map_types(&type_words.join(" ")),
            default: default.filter(|d| !d.is_empty()),
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(mode) = self.mode {
            out.push_str(mode);
            out.push(' ');
        }
        out.push_str(&self.name);
        out.push(' ');
        out.push_str(&self.data_type);
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        out
    }
}

/// The parts of an Oracle `CREATE PROCEDURE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleProcedure {
    pub or_replace: bool,
    pub name: String,
    pub params: Vec<ProcedureParam>,
    /// Text between `IS`/`AS` and `BEGIN`, types already mapped
    pub declarations: String,
    /// Text between `BEGIN` and the closing `END`, unconverted
    pub body: String,
}

impl OracleProcedure {
    /// Split a whole procedure into its parts.
    ///
    /// Anything that is not a single complete procedure is a parse failure.
    pub fn parse(text: &str) -> SqlResult<Self> {
        let caps = procedure_regex()?
            .captures(text)
            .ok_or_else(|| malformed("text is not a single CREATE PROCEDURE statement"))?;

        let name = caps.name("name").map(|m| m.as_str()).unwrap_or_default();
        if let Some(end_name) = caps.name("end_name") {
            let short = name.rsplit('.').next().unwrap_or(name);
            let end_name = end_name.as_str();
            if !end_name
                .trim_matches('"')
                .eq_ignore_ascii_case(short.trim_matches('"'))
            {
                return Err(malformed(&format!(
                    "END {} does not close procedure {}",
                    end_name,
                    name
                )));
            }
        }

        let params = match caps.name("params") {
            Some(m) => {
                let inner = &m.as_str()[1..m.as_str().len() - 1];
                split_top_level(inner)
                    .into_iter()
                    .filter(|p| !p.trim().is_empty())
                    .map(ProcedureParam::parse)
                    .collect::<SqlResult<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        let declarations = caps.name("decls").map(|m| m.as_str()).unwrap_or_default();
        let body = caps.name("body").map(|m| m.as_str()).unwrap_or_default();

        Ok(Self {
            or_replace: caps.name("replace").is_some(),
            name: name.to_string(),
            params,
            declarations: map_types(declarations.trim()),
            body: body.trim().to_string(),
        })
    }

    /// Emit a PL/pgSQL procedure around an already converted body.
    pub fn render_plpgsql(&self, converted_body: &str) -> String {
        let body = converted_body.trim();
        let tag = dollar_tag(body, &self.declarations);
        let params: Vec<String> = self.params.iter().map(ProcedureParam::render).collect();

        let mut out = String::from("CREATE ");
        if self.or_replace {
            out.push_str("OR REPLACE ");
        }
        out.push_str(&format!("PROCEDURE {}({})\n", self.name, params.join(", ")));
        out.push_str("LANGUAGE plpgsql\n");
        out.push_str(&format!("AS {}\n", tag));
        if !self.declarations.is_empty() {
            out.push_str("DECLARE\n");
            out.push_str(&self.declarations);
            out.push('\n');
        }
        out.push_str("BEGIN\n");
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }
        out.push_str("END;\n");
        out.push_str(&tag);
        out.push(';');
        out
    }
}

fn malformed(message: &str) -> SqlError {
    SqlError::ParseFailure {
        message: format!("procedure structure not recognised: {}", message),
        line: 0,
        column: 0,
    }
}

/// `$$`, or a tagged quote when the text already contains `$$`
fn dollar_tag(body: &str, declarations: &str) -> String {
    if body.contains("$$") || declarations.contains("$$") {
        "$body$".to_string()
    } else {
        "$$".to_string()
    }
}

/// Split on commas outside parentheses
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn postgres_type(word: &str) -> Option<&'static str> {
    let mapped = match word.to_ascii_uppercase().as_str() {
        "VARCHAR2" | "NVARCHAR2" => "VARCHAR",
        "NUMBER" => "NUMERIC",
        "PLS_INTEGER" | "BINARY_INTEGER" => "INTEGER",
        "CLOB" | "NCLOB" => "TEXT",
        "BLOB" | "RAW" => "BYTEA",
        _ => return None,
    };
    Some(mapped)
}

/// Replace Oracle type names outside literals and comments.
pub fn map_types(text: &str) -> String {
    let mask = LexicalMask::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in mask.tokens(text) {
        if token.kind != TokenKind::Word {
            continue;
        }
        if let Some(mapped) = postgres_type(token.text(text)) {
            out.push_str(&text[cursor..token.start]);
            out.push_str(mapped);
            cursor = token.end;
        }
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
#[path = "procedure_test.rs"]
mod tests;

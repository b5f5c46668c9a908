//! Prompt template library
//!
//! Each [`PromptKind`] maps to exactly one minijinja template, so adding a
//! prompt is a new enum variant plus its template text.

use dx_core::lexer::LexicalMask;
use dx_core::{Dialect, ProceduralLanguage};
use minijinja::{context, Environment, UndefinedBehavior};
use serde::Serialize;

use crate::error::InferenceResult;

/// System message sent with every prompt
pub const SYSTEM_MESSAGE: &str = "You are an expert SQL conversion assistant. \
Return complete, directly executable SQL only. Never omit parts of the statement, \
never add explanations, and keep special characters and formatting intact.";

/// Complexity from which the complex-query prompt is used
pub const COMPLEX_PROMPT_MIN: u8 = 7;

/// Closed set of prompt templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    BasicConversion,
    OracleToPostgres,
    PlsqlProcedure,
    PlsqlFunction,
    PlsqlBlock,
    DynamicCall,
    ComplexSql,
    ErrorRecovery,
}

impl PromptKind {
    pub const ALL: [PromptKind; 8] = [
        PromptKind::BasicConversion,
        PromptKind::OracleToPostgres,
        PromptKind::PlsqlProcedure,
        PromptKind::PlsqlFunction,
        PromptKind::PlsqlBlock,
        PromptKind::DynamicCall,
        PromptKind::ComplexSql,
        PromptKind::ErrorRecovery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptKind::BasicConversion => "basic_conversion",
            PromptKind::OracleToPostgres => "oracle_to_postgres",
            PromptKind::PlsqlProcedure => "plsql_procedure",
            PromptKind::PlsqlFunction => "plsql_function",
            PromptKind::PlsqlBlock => "plsql_block",
            PromptKind::DynamicCall => "dynamic_call",
            PromptKind::ComplexSql => "complex_sql",
            PromptKind::ErrorRecovery => "error_recovery",
        }
    }

    fn template(self) -> &'static str {
        match self {
            PromptKind::BasicConversion => BASIC_CONVERSION,
            PromptKind::OracleToPostgres => ORACLE_TO_POSTGRES,
            PromptKind::PlsqlProcedure => PLSQL_PROCEDURE,
            PromptKind::PlsqlFunction => PLSQL_FUNCTION,
            PromptKind::PlsqlBlock => PLSQL_BLOCK,
            PromptKind::DynamicCall => DYNAMIC_CALL,
            PromptKind::ComplexSql => COMPLEX_SQL,
            PromptKind::ErrorRecovery => ERROR_RECOVERY,
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const FOOTER: &str = r#"
{%- if rules %}

Dialect conversion rules for {{ source }}:
{%- for group in rules %}
{{ group.name }}:
{%- for mapping in group.mappings %}
  {{ mapping[0] }} -> {{ mapping[1] }}
{%- endfor %}
{%- endfor %}
{%- endif %}

Requirements:
{%- for requirement in requirements %}
{{ loop.index }}. {{ requirement }}
{%- endfor %}
"#;

const BASIC_CONVERSION: &str = r#"Convert the following SQL from {{ source }} to {{ target }}.

1. The result must execute correctly on {{ target }}.
2. Keep the business logic unchanged.
3. Follow {{ target }} conventions where they differ.
4. Keep comments and formatting where possible.

Source SQL:
{{ sql }}

Return only the converted SQL, without any explanation.
{% include "footer" %}"#;

const ORACLE_TO_POSTGRES: &str = r#"Convert the following Oracle SQL to {{ target }}.

Specific conversions:
1. SYSDATE -> CURRENT_DATE or NOW()
2. TO_DATE(text, 'yyyy-mm-dd hh24:mi:ss') -> TO_TIMESTAMP(text, 'YYYY-MM-DD HH24:MI:SS')
3. DECODE -> CASE WHEN
4. CONNECT BY -> WITH RECURSIVE
5. (+) outer join syntax -> ANSI OUTER JOIN
6. ROWNUM -> ROW_NUMBER() or LIMIT
7. Package specifications and bodies -> functions in a schema

Oracle SQL:
{{ sql }}

Return the complete {{ target }} SQL and make sure it is syntactically valid.
{% include "footer" %}"#;

const PLSQL_PROCEDURE: &str = r#"Convert the following Oracle PL/SQL procedure to a {{ target }} procedure.

Rules:
1. CREATE OR REPLACE PROCEDURE name IS -> CREATE OR REPLACE PROCEDURE name() LANGUAGE plpgsql AS $$
2. Declare variables in a DECLARE section before BEGIN
3. Give every parameter an explicit type
4. Use EXCEPTION WHEN ... THEN for error handling
5. Use PL/pgSQL cursor syntax
6. Use EXECUTE format(...) for dynamic SQL

Oracle procedure:
{{ sql }}

Return the PL/pgSQL procedure.
{% include "footer" %}"#;

const PLSQL_FUNCTION: &str = r#"Convert the following Oracle PL/SQL function to a {{ target }} function.

Rules:
1. Declare the return type with RETURNS
2. Use LANGUAGE plpgsql
3. Enclose the body in $$
4. Map Oracle-specific data types
5. Adapt exception handling

Oracle function:
{{ sql }}

Return the PL/pgSQL function.
{% include "footer" %}"#;

const PLSQL_BLOCK: &str = r#"Convert the following Oracle PL/SQL anonymous block to a {{ target }} DO statement.

Rules:
1. DECLARE ... BEGIN ... END; -> DO $$ DECLARE ... BEGIN ... END $$;
2. Keep variable declarations
3. Use PL/pgSQL exception handling
4. Give every variable a valid data type

Oracle block:
{{ sql }}

Return the DO statement.
{% include "footer" %}"#;

const DYNAMIC_CALL: &str = r#"The following {{ source }} code contains dynamic SQL calls ({{ wrappers }}) whose single string argument is itself SQL.

{{ sql }}

1. Convert only the SQL inside each call's string argument to {{ target }}
2. Keep the call syntax itself unchanged
3. Keep the inner SQL a valid string literal

Return the complete converted code.
{% include "footer" %}"#;

const COMPLEX_SQL: &str = r#"Convert the following complex SQL ({{ source }} -> {{ target }}). It uses several joins, nested queries or advanced features such as window functions, recursive queries or conditional logic.

{{ sql }}

Analyse it carefully and keep the same business logic and performance characteristics.
{% include "footer" %}"#;

const ERROR_RECOVERY: &str = r#"A previous conversion of this SQL failed. Fix the problem and convert it again.

Source SQL ({{ source }} -> {{ target }}):
{{ sql }}

Error:
{{ error_message }}

Return only the corrected, converted SQL."#;

/// Fixed output requirements appended to conversion prompts
pub const REQUIREMENTS: [&str; 5] = [
    "Syntax follows the target dialect",
    "Business logic is unchanged",
    "Performance and readability are preserved or improved",
    "Data types are compatible",
    "Error handling is appropriate",
];

/// Named group of source-to-target hints
#[derive(Debug, Clone, Serialize)]
pub struct RuleGroup {
    pub name: &'static str,
    pub mappings: &'static [(&'static str, &'static str)],
}

const ORACLE_RULES: &[RuleGroup] = &[
    RuleGroup {
        name: "date_functions",
        mappings: &[
            ("SYSDATE", "CURRENT_DATE"),
            ("TO_DATE", "TO_TIMESTAMP"),
            ("ADD_MONTHS", "date + interval"),
            ("MONTHS_BETWEEN", "EXTRACT(MONTH FROM age)"),
        ],
    },
    RuleGroup {
        name: "string_functions",
        mappings: &[("SUBSTR", "SUBSTRING"), ("INSTR", "POSITION")],
    },
    RuleGroup {
        name: "control_flow",
        mappings: &[("DECODE", "CASE WHEN"), ("NVL", "COALESCE"), ("NVL2", "CASE WHEN")],
    },
    RuleGroup {
        name: "syntax_patterns",
        mappings: &[
            ("(+)", "LEFT/RIGHT JOIN"),
            ("ROWNUM", "ROW_NUMBER()"),
            ("CONNECT BY", "WITH RECURSIVE"),
            ("START WITH", "WITH RECURSIVE"),
        ],
    },
];

const POSTGRES_RULES: &[RuleGroup] = &[
    RuleGroup {
        name: "date_functions",
        mappings: &[
            ("CURRENT_DATE", "SYSDATE"),
            ("TO_TIMESTAMP", "TO_DATE"),
            ("date + interval", "ADD_MONTHS"),
        ],
    },
    RuleGroup {
        name: "string_functions",
        mappings: &[("SUBSTRING", "SUBSTR"), ("POSITION", "INSTR")],
    },
    RuleGroup {
        name: "control_flow",
        mappings: &[("CASE WHEN", "DECODE"), ("COALESCE", "NVL")],
    },
    RuleGroup {
        name: "syntax_patterns",
        mappings: &[("LEFT/RIGHT JOIN", "(+)"), ("ROW_NUMBER()", "ROWNUM")],
    },
];

/// Rule table for a source dialect, if one exists
pub fn dialect_rules(source: Dialect) -> &'static [RuleGroup] {
    match source {
        Dialect::Oracle => ORACLE_RULES,
        Dialect::Postgres => POSTGRES_RULES,
        _ => &[],
    }
}

/// Inputs for rendering a prompt
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub sql: &'a str,
    pub source: Dialect,
    pub target: Dialect,
    pub wrappers: &'a [String],
    pub error_message: Option<&'a str>,
}

/// Compiled prompt templates
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptLibrary").finish_non_exhaustive()
    }
}

impl PromptLibrary {
    pub fn new() -> InferenceResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template("footer", FOOTER)?;
        for kind in PromptKind::ALL {
            env.add_template(kind.as_str(), kind.template())?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, kind: PromptKind, ctx: &PromptContext<'_>) -> InferenceResult<String> {
        let template = self.env.get_template(kind.as_str())?;
        let rendered = template.render(context! {
            sql => ctx.sql.trim(),
            source => ctx.source.display_name(),
            target => ctx.target.display_name(),
            wrappers => ctx.wrappers.join(", "),
            error_message => ctx.error_message.unwrap_or_default(),
            rules => dialect_rules(ctx.source),
            requirements => REQUIREMENTS,
        })?;
        Ok(rendered)
    }
}

/// Pick the template for a unit of `sql`
pub fn select_prompt(
    sql: &str,
    source: Dialect,
    target: Dialect,
    complexity: u8,
    wrappers: &[String],
) -> PromptKind {
    let mask = LexicalMask::scan(sql);
    let tokens = mask.tokens(sql);
    let words: Vec<String> = tokens
        .iter()
        .map(|t| t.text(sql).to_ascii_uppercase())
        .collect();
    let has = |w: &str| words.iter().any(|x| x == w);

    if source == Dialect::Oracle
        && target.procedural_language() == Some(ProceduralLanguage::PlPgSql)
    {
        return match created_routine(&words) {
            Some("PROCEDURE") => PromptKind::PlsqlProcedure,
            Some(_) => PromptKind::PlsqlFunction,
            None if has("DECLARE") || has("BEGIN") => PromptKind::PlsqlBlock,
            None => PromptKind::OracleToPostgres,
        };
    }

    if wrappers.iter().any(|w| has(w.to_ascii_uppercase().as_str())) {
        return PromptKind::DynamicCall;
    }
    if complexity >= COMPLEX_PROMPT_MIN {
        return PromptKind::ComplexSql;
    }
    PromptKind::BasicConversion
}

/// `PROCEDURE` or `FUNCTION` when the text creates one
fn created_routine(words: &[String]) -> Option<&'static str> {
    for (i, word) in words.iter().enumerate() {
        if word != "CREATE" {
            continue;
        }
        let mut j = i + 1;
        if words.get(j).map(String::as_str) == Some("OR")
            && words.get(j + 1).map(String::as_str) == Some("REPLACE")
        {
            j += 2;
        }
        if matches!(
            words.get(j).map(String::as_str),
            Some("EDITIONABLE" | "NONEDITIONABLE")
        ) {
            j += 1;
        }
        match words.get(j).map(String::as_str) {
            Some("PROCEDURE") => return Some("PROCEDURE"),
            Some("FUNCTION") => return Some("FUNCTION"),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;

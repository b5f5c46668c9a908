//! Dialects command implementation

use anyhow::Result;
use dx_core::{Dialect, ProceduralLanguage};

/// Execute the dialects command
pub(crate) fn execute() -> Result<()> {
    println!("{:<12} {:<28} {:<6} PROCEDURAL", "NAME", "ENGINE", "QUOTE");
    for dialect in Dialect::ALL {
        let procedural = dialect.procedural_language().map_or("-", language_name);
        println!(
            "{:<12} {:<28} {:<6} {}",
            dialect.name(),
            dialect.display_name(),
            dialect.identifier_quote(),
            procedural
        );
    }
    Ok(())
}

fn language_name(lang: ProceduralLanguage) -> &'static str {
    match lang {
        ProceduralLanguage::PlSql => "PL/SQL",
        ProceduralLanguage::PlPgSql => "PL/pgSQL",
        ProceduralLanguage::TSql => "T-SQL",
        ProceduralLanguage::SqlPsm => "SQL/PSM",
        ProceduralLanguage::SnowflakeScripting => "Snowflake Scripting",
        ProceduralLanguage::BigQueryScript => "BigQuery scripting",
    }
}

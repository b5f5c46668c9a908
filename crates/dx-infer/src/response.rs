//! Cleaning and validation of generated SQL

use dx_core::lexer::LexicalMask;

/// Responses may always be at least this long, however short the input
pub const MIN_LENGTH_ALLOWANCE: usize = 200;

const SQL_VERBS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "CREATE", "ALTER", "DROP", "TRUNCATE",
    "WITH", "DO", "BEGIN", "DECLARE", "CALL", "EXEC", "EXECUTE", "GRANT", "REVOKE",
];

const APOLOGY_PHRASES: &[&str] = &[
    "i'm sorry",
    "i am sorry",
    "i apologize",
    "i cannot",
    "i can't",
    "unable to convert",
    "as an ai",
    "please note",
    "抱歉",
    "无法",
    "错误",
    "对不起",
    "请注意",
    "说明",
];

const LEAD_IN_PREFIXES: &[&str] = &[
    "here is",
    "here's",
    "the converted",
    "converted sql",
    "below is",
    "the following",
    "以下是",
    "转换结果",
    "转换后的",
    "上面的",
];

/// Strip markdown and explanatory prose from a raw response.
///
/// Fenced code wins when present. Otherwise markdown headings and lead-in
/// sentences are dropped and the remaining lines kept as written.
pub fn clean_response(raw: &str) -> String {
    if let Some(fenced) = fenced_code(raw) {
        return fenced.trim().to_string();
    }

    raw.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with('#') || trimmed.starts_with("```") || is_lead_in(trimmed))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_lead_in(line: &str) -> bool {
    let lowered = line.to_lowercase();
    LEAD_IN_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

/// Content of every fenced block, joined by newlines
fn fenced_code(raw: &str) -> Option<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in raw.lines() {
        if line.trim_start().starts_with("```") {
            match current.take() {
                Some(lines) => blocks.push(lines.join("\n")),
                None => current = Some(Vec::new()),
            }
            continue;
        }
        if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }
    // An unclosed fence still counts
    if let Some(lines) = current {
        blocks.push(lines.join("\n"));
    }
    let joined = blocks.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Check cleaned output against the input it was generated from.
///
/// Returns the rejection reason on failure.
pub fn validate_response(
    cleaned: &str,
    original: &str,
    max_length_ratio: f64,
) -> Result<(), String> {
    if cleaned.trim().is_empty() {
        return Err("response is empty".to_string());
    }

    let mask = LexicalMask::scan(cleaned);
    let has_verb = mask
        .tokens(cleaned)
        .iter()
        .any(|t| SQL_VERBS.iter().any(|verb| t.is_keyword(cleaned, verb)));
    if !has_verb {
        return Err("response contains no SQL statement".to_string());
    }

    let limit = ((original.chars().count() as f64) * max_length_ratio) as usize;
    let limit = limit.max(MIN_LENGTH_ALLOWANCE);
    let length = cleaned.chars().count();
    if length > limit {
        return Err(format!(
            "response is {} characters, more than the {} allowed for this input",
            length, limit
        ));
    }

    let lowered = cleaned.to_lowercase();
    if let Some(phrase) = APOLOGY_PHRASES.iter().find(|p| lowered.contains(*p)) {
        return Err(format!("response contains explanatory text ('{}')", phrase));
    }

    Ok(())
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;

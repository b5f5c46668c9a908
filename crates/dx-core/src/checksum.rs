//! SHA-256 content keys for the conversion cache.

use crate::lexer::{LexicalMask, MaskKind};
use sha2::{Digest, Sha256};

/// Collapse whitespace runs outside literals to a single space and trim.
///
/// Two inputs that differ only in layout normalise to the same text, so they
/// share a cache entry. Literal and comment text is kept byte-for-byte, and
/// the line break ending a `--` comment stays a line break.
pub fn normalize_sql_text(text: &str) -> String {
    let mask = LexicalMask::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let push_code = |out: &mut String, code: &str| {
        let mut pending_space = false;
        for c in code.chars() {
            if c.is_whitespace() {
                pending_space = true;
            } else {
                if pending_space && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
        if pending_space && !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
    };
    for span in mask.spans() {
        push_code(&mut out, &text[cursor..span.start]);
        out.push_str(&text[span.start..span.end]);
        if span.kind == MaskKind::LineComment && span.end < text.len() {
            out.push('\n');
        }
        cursor = span.end;
    }
    push_code(&mut out, &text[cursor..]);
    out.trim_end().to_string()
}

/// Cache key for a `(source, target, text)` triple.
///
/// Fields are joined with a NUL separator so that no dialect/text split can
/// collide with another.
pub fn conversion_key(source: &str, target: &str, text: &str) -> String {
    let normalized = normalize_sql_text(text);
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(target.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

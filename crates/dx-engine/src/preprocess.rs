//! Text normalisation before segmentation and after reassembly
//!
//! Every step consults a [`LexicalMask`], so whitespace inside multi-line
//! string literals, quoted identifiers and block comments is never touched.

use dx_core::lexer::TokenKind;
use dx_core::{LexicalMask, MaskKind};

/// Normalise a document before it is segmented
pub fn preprocess(text: &str) -> String {
    ensure_terminator(&collapse_blank_lines(&trim_line_ends(text)))
}

/// Drop trailing whitespace from every line
pub fn trim_line_ends(text: &str) -> String {
    let mask = LexicalMask::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let (content, newline) = split_newline(line);
        let kept = content.trim_end();
        let trailing_at = offset + kept.len();
        let inside_literal = kept.len() < content.len()
            && mask
                .span_at(trailing_at)
                .is_some_and(|s| s.kind != MaskKind::LineComment);
        if inside_literal {
            out.push_str(content);
        } else {
            out.push_str(kept);
        }
        out.push_str(newline);
        offset += line.len();
    }
    out
}

/// Collapse runs of blank lines into a single blank line
pub fn collapse_blank_lines(text: &str) -> String {
    let mask = LexicalMask::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut offset = 0;
    let mut previous_blank = false;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty() && !mask.is_masked(offset);
        if !(blank && previous_blank) {
            out.push_str(line);
        }
        previous_blank = blank;
        offset += line.len();
    }
    out
}

/// Append `;` when the last significant content is an unterminated statement.
///
/// Nothing is appended after a comment, an existing `;`, a lone `/` line, or
/// text that ends inside an unterminated literal.
pub fn ensure_terminator(text: &str) -> String {
    let significant = text.trim_end();
    if significant.is_empty() || significant.ends_with(';') {
        return text.to_string();
    }
    let last_line = significant.rsplit('\n').next().unwrap_or(significant);
    if last_line.trim() == "/" {
        return text.to_string();
    }

    let mask = LexicalMask::scan(significant);
    if mask.unterminated().is_some() {
        return text.to_string();
    }
    let ends_in_comment = mask.span_at(significant.len() - 1).is_some_and(|s| {
        matches!(s.kind, MaskKind::LineComment | MaskKind::BlockComment)
    });
    if ends_in_comment {
        return text.to_string();
    }

    format!("{};{}", significant, &text[significant.len()..])
}

/// Make `converted` end with a `;` exactly when `original` does.
///
/// Only code terminators count; a `;` inside a trailing comment or literal
/// is ignored.
pub fn harmonize_terminator(converted: &str, original: &str) -> String {
    let text = converted.trim();
    if text.is_empty() {
        return String::new();
    }
    let wants = ends_with_terminator(original);
    let mask = LexicalMask::scan(text);
    let last = mask.tokens(text).last().copied();
    let has = last.is_some_and(|t| t.kind == TokenKind::Semicolon);

    match (wants, has) {
        (true, false) => {
            let ends_in_line_comment = mask
                .span_at(text.len() - 1)
                .is_some_and(|s| s.kind == MaskKind::LineComment);
            if ends_in_line_comment {
                format!("{}\n;", text)
            } else {
                format!("{};", text)
            }
        }
        (false, true) => match last {
            Some(t) => format!("{}{}", text[..t.start].trim_end(), &text[t.end..]),
            None => text.to_string(),
        },
        _ => text.to_string(),
    }
}

/// Whether the last code token of `text` is `;`
pub fn ends_with_terminator(text: &str) -> bool {
    let mask = LexicalMask::scan(text);
    mask.tokens(text)
        .last()
        .is_some_and(|t| t.kind == TokenKind::Semicolon)
}

fn split_newline(line: &str) -> (&str, &str) {
    let content = line.strip_suffix('\n').unwrap_or(line);
    let content = content.strip_suffix('\r').unwrap_or(content);
    (content, &line[content.len()..])
}

#[cfg(test)]
#[path = "preprocess_test.rs"]
mod tests;

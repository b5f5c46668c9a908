//! Lexical masking of SQL text
//!
//! Region detection and scoring work on keywords, so they must not be fooled
//! by keywords that appear inside string literals, quoted identifiers or
//! comments. [`LexicalMask`] records the byte spans of those constructs in a
//! single pass; all delimiters are ASCII so byte-level scanning is safe on
//! UTF-8 input.

use std::ops::Range;

/// Kind of a masked (non-code) span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    /// `'...'` with `''` escapes
    StringLiteral,
    /// `"..."` or `` `...` ``
    QuotedIdentifier,
    /// `-- ...` up to (not including) the newline
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// `$tag$ ... $tag$`
    DollarQuoted,
}

/// A masked byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSpan {
    pub kind: MaskKind,
    pub start: usize,
    pub end: usize,
}

/// Byte spans of literals, quoted identifiers and comments in a SQL text
#[derive(Debug, Clone, Default)]
pub struct LexicalMask {
    spans: Vec<MaskedSpan>,
    unterminated: Option<MaskKind>,
}

/// A code token produced by [`LexicalMask::tokens`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Word,
    /// `;`
    Semicolon,
    /// A complete dollar-quoted body
    DollarBody,
}

/// A token in the code (unmasked) part of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Source text of the token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Case-insensitive keyword comparison for word tokens
    pub fn is_keyword(&self, source: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text(source).eq_ignore_ascii_case(keyword)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}

impl LexicalMask {
    /// Scan `text` and record every masked span.
    pub fn scan(text: &str) -> Self {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut spans = Vec::new();
        let mut unterminated = None;
        let mut i = 0;

        while i < len {
            let b = bytes[i];
            match b {
                b'\'' | b'"' | b'`' => {
                    let kind = if b == b'\'' {
                        MaskKind::StringLiteral
                    } else {
                        MaskKind::QuotedIdentifier
                    };
                    let start = i;
                    i += 1;
                    let mut closed = false;
                    while i < len {
                        if bytes[i] == b {
                            if i + 1 < len && bytes[i + 1] == b {
                                i += 2;
                                continue;
                            }
                            i += 1;
                            closed = true;
                            break;
                        }
                        i += 1;
                    }
                    if !closed {
                        unterminated = Some(kind);
                    }
                    spans.push(MaskedSpan {
                        kind,
                        start,
                        end: i,
                    });
                }
                b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                    let start = i;
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                    spans.push(MaskedSpan {
                        kind: MaskKind::LineComment,
                        start,
                        end: i,
                    });
                }
                b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                    let start = i;
                    match text[i + 2..].find("*/") {
                        Some(offset) => i = i + 2 + offset + 2,
                        None => {
                            i = len;
                            unterminated = Some(MaskKind::BlockComment);
                        }
                    }
                    spans.push(MaskedSpan {
                        kind: MaskKind::BlockComment,
                        start,
                        end: i,
                    });
                }
                b'$' if i == 0 || !is_ident_byte(bytes[i - 1]) => {
                    match dollar_tag_len(&bytes[i..]) {
                        Some(tag_len) => {
                            let start = i;
                            let tag = &text[i..i + tag_len];
                            let body_start = i + tag_len;
                            match text[body_start..].find(tag) {
                                Some(offset) => i = body_start + offset + tag_len,
                                None => {
                                    i = len;
                                    unterminated = Some(MaskKind::DollarQuoted);
                                }
                            }
                            spans.push(MaskedSpan {
                                kind: MaskKind::DollarQuoted,
                                start,
                                end: i,
                            });
                        }
                        None => i += 1,
                    }
                }
                _ => i += 1,
            }
        }

        Self {
            spans,
            unterminated,
        }
    }

    /// All masked spans in text order
    pub fn spans(&self) -> &[MaskedSpan] {
        &self.spans
    }

    /// Kind of the construct left open at end of text, if any
    pub fn unterminated(&self) -> Option<MaskKind> {
        self.unterminated
    }

    /// The masked span containing `pos`, if any
    pub fn span_at(&self, pos: usize) -> Option<&MaskedSpan> {
        let idx = self.spans.partition_point(|s| s.end <= pos);
        self.spans
            .get(idx)
            .filter(|s| s.start <= pos && pos < s.end)
    }

    /// Whether `pos` falls inside a literal, quoted identifier or comment
    pub fn is_masked(&self, pos: usize) -> bool {
        self.span_at(pos).is_some()
    }

    /// Spans of a given kind
    pub fn spans_of(&self, kind: MaskKind) -> impl Iterator<Item = Range<usize>> + '_ {
        self.spans
            .iter()
            .filter(move |s| s.kind == kind)
            .map(|s| s.start..s.end)
    }

    /// Copy of `text` with every masked byte replaced by a space.
    ///
    /// Byte offsets are preserved, so positions found in the result index
    /// directly into `text`.
    pub fn code_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in &self.spans {
            out.push_str(&text[cursor..span.start]);
            out.extend(std::iter::repeat(' ').take(span.end - span.start));
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Words, semicolons and dollar bodies of the unmasked part of `text`.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut spans = self.spans.iter().peekable();
        let mut i = 0;

        while i < bytes.len() {
            if let Some(span) = spans.peek() {
                if span.start == i {
                    if span.kind == MaskKind::DollarQuoted {
                        tokens.push(Token {
                            kind: TokenKind::DollarBody,
                            start: span.start,
                            end: span.end,
                        });
                    }
                    i = span.end;
                    spans.next();
                    continue;
                }
            }
            let b = bytes[i];
            if b == b';' {
                tokens.push(Token {
                    kind: TokenKind::Semicolon,
                    start: i,
                    end: i + 1,
                });
                i += 1;
            } else if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    start,
                    end: i,
                });
            } else if b.is_ascii_digit() {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                    i += 1;
                }
            } else {
                i += 1;
            }
        }

        tokens
    }
}

/// Length of a `$tag$` opener at the start of `bytes`, if one is present.
fn dollar_tag_len(bytes: &[u8]) -> Option<usize> {
    let mut j = 1;
    if j < bytes.len() && bytes[j].is_ascii_digit() {
        return None;
    }
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        j += 1;
    }
    (j < bytes.len() && bytes[j] == b'$').then_some(j + 1)
}

/// Check that parentheses outside literals and comments are balanced.
pub fn parentheses_balanced(text: &str, mask: &LexicalMask) -> bool {
    let mut depth: i64 = 0;
    for (i, b) in text.bytes().enumerate() {
        if b != b'(' && b != b')' {
            continue;
        }
        if mask.is_masked(i) {
            continue;
        }
        depth += if b == b'(' { 1 } else { -1 };
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

#[cfg(test)]
#[path = "lexer_test.rs"]
mod tests;

//! Region matching and document segmentation
//!
//! [`RegionMatcher::match_regions`] finds the special regions of a document
//! (procedural blocks, dynamic calls, comment blocks) as an ordered,
//! non-overlapping list. [`RegionMatcher::segment`] additionally splits the
//! implicit plain gaps into verbatim text and SQL statement batches, giving a
//! layout whose pieces concatenate back to the original document.

use crate::config::is_identifier;
use crate::error::{CoreError, CoreResult};
use crate::lexer::{LexicalMask, MaskKind, Token, TokenKind};
use crate::region::{Region, RegionKind};
use regex::Regex;
use std::ops::Range;

/// `END <word>` pairs that close control flow rather than a block
const CONTROL_FLOW_ENDS: &[&str] = &["IF", "LOOP", "WHILE", "REPEAT", "FOR"];

/// Words after `BEGIN` that make it transaction control
const TRANSACTION_WORDS: &[&str] = &["TRANSACTION", "TRAN", "WORK", "ISOLATION"];

/// Modifiers allowed between `CREATE [OR REPLACE]` and `PROCEDURE|FUNCTION`
const ROUTINE_MODIFIERS: &[&str] = &["EDITIONABLE", "NONEDITIONABLE", "TEMP", "TEMPORARY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Begin,
    Case,
}

/// One piece of a segmented document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Text copied to the output unchanged (blank lines, line comments, whitespace)
    Verbatim { start: usize, end: usize },
    /// Text converted as one unit
    Unit(Region),
}

/// A document split into verbatim pieces and conversion units
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub pieces: Vec<Piece>,
    /// The trimmed document is a single procedural block
    pub whole_document: bool,
}

impl Segmentation {
    /// Regions to convert, in document order
    pub fn units(&self) -> impl Iterator<Item = &Region> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Unit(region) => Some(region),
            Piece::Verbatim { .. } => None,
        })
    }

    /// Concatenate all pieces; equals the document the segmentation came from
    pub fn reconstruct(&self, document: &str) -> String {
        let mut out = String::with_capacity(document.len());
        for piece in &self.pieces {
            match piece {
                Piece::Verbatim { start, end } => out.push_str(&document[*start..*end]),
                Piece::Unit(region) => out.push_str(&region.text),
            }
        }
        out
    }

    fn push_verbatim(&mut self, span: Range<usize>) {
        if span.is_empty() {
            return;
        }
        if let Some(Piece::Verbatim { end, .. }) = self.pieces.last_mut() {
            if *end == span.start {
                *end = span.end;
                return;
            }
        }
        self.pieces.push(Piece::Verbatim {
            start: span.start,
            end: span.end,
        });
    }
}

/// Inner SQL of a dynamic call, with the wrapper text around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicCall<'a> {
    /// Wrapper text up to and including the opening quote
    pub prefix: &'a str,
    /// Unescaped inner SQL
    pub inner: String,
    /// Closing quote onwards
    pub suffix: &'a str,
}

impl DynamicCall<'_> {
    /// Rebuild the call around converted inner SQL, re-escaping quotes
    pub fn rebuild(&self, converted_inner: &str) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            converted_inner.replace('\'', "''"),
            self.suffix
        )
    }
}

/// Finds typed regions in SQL documents
#[derive(Debug, Clone)]
pub struct RegionMatcher {
    wrappers: Vec<String>,
    dynamic_call: Option<Regex>,
}

impl RegionMatcher {
    /// Create a matcher recognising the given dynamic wrapper names
    pub fn new<S: AsRef<str>>(wrappers: &[S]) -> CoreResult<Self> {
        let mut names = Vec::with_capacity(wrappers.len());
        for wrapper in wrappers {
            let name = wrapper.as_ref();
            if !is_identifier(name) {
                return Err(CoreError::InvalidWrapperName {
                    name: name.to_string(),
                });
            }
            names.push(name.to_string());
        }

        let dynamic_call = if names.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
            let pattern = format!(
                r"(?i)\b(?:{})\s*\(\s*'(?P<inner>(?:[^']|'')*)'\s*\)\s*;",
                alternatives.join("|")
            );
            let re = Regex::new(&pattern).map_err(|e| CoreError::ConfigInvalid {
                message: format!("dynamic wrapper pattern: {}", e),
            })?;
            Some(re)
        };

        Ok(Self {
            wrappers: names,
            dynamic_call,
        })
    }

    pub fn wrappers(&self) -> &[String] {
        &self.wrappers
    }

    /// Special regions of `document`, ordered and non-overlapping.
    ///
    /// Everything not covered is implicitly plain SQL.
    pub fn match_regions(&self, document: &str) -> Vec<Region> {
        let mask = LexicalMask::scan(document);
        self.select_regions(document, &mask)
    }

    /// Span of the trimmed document when it is exactly one procedural block
    pub fn whole_document_block(&self, document: &str) -> Option<Range<usize>> {
        let start = document.len() - document.trim_start().len();
        let end = document.trim_end().len();
        if start >= end {
            return None;
        }
        let mask = LexicalMask::scan(document);
        procedural_candidates(document, &mask)
            .into_iter()
            .find(|c| c.start == start && c.end == end)
    }

    /// Split `document` into verbatim pieces and conversion units
    pub fn segment(&self, document: &str) -> Segmentation {
        let mut segmentation = Segmentation::default();

        if let Some(span) = self.whole_document_block(document) {
            segmentation.whole_document = true;
            segmentation.push_verbatim(0..span.start);
            segmentation.pieces.push(Piece::Unit(Region::from_span(
                RegionKind::ProceduralBlock,
                document,
                span.clone(),
            )));
            segmentation.push_verbatim(span.end..document.len());
            return segmentation;
        }

        let mask = LexicalMask::scan(document);
        let code = mask.code_text(document);
        let mut cursor = 0;
        for region in self.select_regions(document, &mask) {
            split_plain(document, &code, &mask, cursor..region.start, &mut segmentation);
            cursor = region.end;
            segmentation.pieces.push(Piece::Unit(region));
        }
        split_plain(document, &code, &mask, cursor..document.len(), &mut segmentation);

        log::debug!(
            "Segmented document into {} pieces ({} units)",
            segmentation.pieces.len(),
            segmentation.units().count()
        );
        segmentation
    }

    /// Split a dynamic call region into wrapper text and unescaped inner SQL
    pub fn parse_dynamic_call<'a>(&self, text: &'a str) -> Option<DynamicCall<'a>> {
        let re = self.dynamic_call.as_ref()?;
        let caps = re.captures(text)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != text.len() {
            return None;
        }
        let inner = caps.name("inner")?;
        Some(DynamicCall {
            prefix: &text[..inner.start()],
            inner: inner.as_str().replace("''", "'"),
            suffix: &text[inner.end()..],
        })
    }

    /// Dynamic call spans anywhere in `text`, masked or not.
    ///
    /// Used for the inner pass over comment blocks, where the whole text is
    /// comment and the lexical mask would hide every call.
    pub fn dynamic_calls_in(&self, text: &str) -> Vec<Range<usize>> {
        match &self.dynamic_call {
            Some(re) => re.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }

    /// Whether an unmasked dynamic call occurs in `document`
    pub(crate) fn has_dynamic_call(&self, document: &str, mask: &LexicalMask) -> bool {
        self.dynamic_call
            .as_ref()
            .is_some_and(|re| re.find_iter(document).any(|m| !mask.is_masked(m.start())))
    }

    fn select_regions(&self, document: &str, mask: &LexicalMask) -> Vec<Region> {
        let mut candidates: Vec<(RegionKind, Range<usize>)> = Vec::new();
        candidates.extend(
            procedural_candidates(document, mask)
                .into_iter()
                .map(|span| (RegionKind::ProceduralBlock, span)),
        );
        if let Some(re) = &self.dynamic_call {
            candidates.extend(
                re.find_iter(document)
                    .filter(|m| !mask.is_masked(m.start()))
                    .map(|m| (RegionKind::DynamicCall, m.range())),
            );
        }
        candidates.extend(
            mask.spans()
                .iter()
                .filter(|s| s.kind == MaskKind::BlockComment)
                .filter(|s| s.end - s.start >= 4 && document[s.start..s.end].ends_with("*/"))
                .map(|s| (RegionKind::CommentBlock, s.start..s.end)),
        );

        // Leftmost first; the longer candidate wins a tie on start
        candidates.sort_by(|a, b| {
            a.1.start
                .cmp(&b.1.start)
                .then_with(|| b.1.len().cmp(&a.1.len()))
        });

        let mut kept = Vec::new();
        let mut last_end = 0;
        for (kind, span) in candidates {
            if span.start >= last_end {
                last_end = span.end;
                kept.push(Region::from_span(kind, document, span));
            }
        }
        kept
    }
}

/// Split a plain gap into verbatim lines and SQL statement batches
fn split_plain(
    document: &str,
    code: &str,
    mask: &LexicalMask,
    gap: Range<usize>,
    out: &mut Segmentation,
) {
    let mut batch: Option<Range<usize>> = None;
    let mut pos = gap.start;

    while pos < gap.end {
        let line_end = document[pos..gap.end]
            .find('\n')
            .map(|i| pos + i + 1)
            .unwrap_or(gap.end);
        let line = &document[pos..line_end];
        let content_start = pos + (line.len() - line.trim_start().len());

        let continues_literal = batch.is_some()
            && mask.span_at(pos).is_some_and(|s| {
                matches!(
                    s.kind,
                    MaskKind::StringLiteral | MaskKind::QuotedIdentifier | MaskKind::DollarQuoted
                ) && s.start < pos
            });
        let is_sql = continues_literal
            || (!line.trim().is_empty()
                && !mask.span_at(content_start).is_some_and(|s| {
                    matches!(s.kind, MaskKind::LineComment | MaskKind::BlockComment)
                }));

        if is_sql {
            batch = Some(match batch {
                Some(b) => b.start..line_end,
                None => pos..line_end,
            });
        } else {
            if let Some(b) = batch.take() {
                flush_batch(document, code, b, out);
            }
            out.push_verbatim(pos..line_end);
        }
        pos = line_end;
    }

    if let Some(b) = batch {
        flush_batch(document, code, b, out);
    }
}

fn flush_batch(document: &str, code: &str, batch: Range<usize>, out: &mut Segmentation) {
    let text = &document[batch.clone()];
    let start = batch.start + (text.len() - text.trim_start().len());
    let end = batch.start + text.trim_end().len();

    // Stray terminators and SQL*Plus `/` lines have nothing to convert
    if start >= end || !code[start..end].chars().any(char::is_alphanumeric) {
        out.push_verbatim(batch);
        return;
    }

    out.push_verbatim(batch.start..start);
    out.pieces.push(Piece::Unit(Region::from_span(
        RegionKind::Plain,
        document,
        start..end,
    )));
    out.push_verbatim(end..batch.end);
}

/// Candidate spans for procedural blocks, one per possible block start
pub(crate) fn procedural_candidates(document: &str, mask: &LexicalMask) -> Vec<Range<usize>> {
    let tokens = mask.tokens(document);
    let mut out = Vec::new();

    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Word {
            continue;
        }
        let end = if tok.is_keyword(document, "CREATE") {
            routine_header_end(document, &tokens, i)
                .and_then(|j| scan_block_end(document, &tokens, j, Vec::new(), true))
        } else if tok.is_keyword(document, "DECLARE") {
            // T-SQL variable declarations are statements, not blocks
            if document[tok.end..].trim_start().starts_with('@') {
                None
            } else {
                scan_block_end(document, &tokens, i + 1, Vec::new(), false)
            }
        } else if tok.is_keyword(document, "BEGIN") {
            if is_transaction_begin(document, &tokens, i) {
                None
            } else {
                scan_block_end(document, &tokens, i + 1, vec![Opener::Begin], false)
            }
        } else {
            None
        };

        if let Some(end) = end {
            out.push(tok.start..end);
        }
    }

    out
}

/// Index of the token after `CREATE [OR REPLACE] [modifier] PROCEDURE|FUNCTION`
fn routine_header_end(document: &str, tokens: &[Token], create: usize) -> Option<usize> {
    let mut j = create + 1;
    if tokens.get(j)?.is_keyword(document, "OR")
        && tokens.get(j + 1)?.is_keyword(document, "REPLACE")
    {
        j += 2;
    }
    if ROUTINE_MODIFIERS
        .iter()
        .any(|m| tokens.get(j).is_some_and(|t| t.is_keyword(document, m)))
    {
        j += 1;
    }
    let kind = tokens.get(j)?;
    (kind.is_keyword(document, "PROCEDURE") || kind.is_keyword(document, "FUNCTION"))
        .then_some(j + 1)
}

fn is_transaction_begin(document: &str, tokens: &[Token], begin: usize) -> bool {
    match tokens.get(begin + 1) {
        None => true,
        Some(next) if next.kind == TokenKind::Semicolon => true,
        Some(next) => TRANSACTION_WORDS
            .iter()
            .any(|w| next.is_keyword(document, w)),
    }
}

/// Byte offset just past the block terminator, scanning from token `from`.
///
/// `stack` holds the openers already consumed. Returns `None` for
/// unterminated or unbalanced blocks.
fn scan_block_end(
    document: &str,
    tokens: &[Token],
    from: usize,
    mut stack: Vec<Opener>,
    allow_dollar_body: bool,
) -> Option<usize> {
    let mut seen_begin = !stack.is_empty();
    let mut dollar_body = false;
    let mut j = from;

    while j < tokens.len() {
        let tok = tokens[j];
        match tok.kind {
            TokenKind::DollarBody => {
                if allow_dollar_body && stack.is_empty() && !seen_begin {
                    dollar_body = true;
                }
            }
            TokenKind::Semicolon => {
                if dollar_body && stack.is_empty() {
                    return Some(tok.end);
                }
            }
            TokenKind::Word => {
                if tok.is_keyword(document, "BEGIN") {
                    if !is_transaction_begin(document, tokens, j) {
                        stack.push(Opener::Begin);
                        seen_begin = true;
                    }
                } else if tok.is_keyword(document, "CASE") {
                    stack.push(Opener::Case);
                } else if tok.is_keyword(document, "END") {
                    let next = tokens.get(j + 1);
                    if next.is_some_and(|n| {
                        CONTROL_FLOW_ENDS.iter().any(|k| n.is_keyword(document, k))
                    }) {
                        j += 2;
                        continue;
                    }
                    let opener = stack.pop()?;
                    let mut after = j + 1;
                    if next.is_some_and(|n| n.is_keyword(document, "CASE")) {
                        after += 1;
                    }
                    if opener == Opener::Begin && stack.is_empty() {
                        return block_terminator(document, tokens, j);
                    }
                    j = after;
                    continue;
                }
            }
        }
        j += 1;
    }

    None
}

/// End offset of `END [name] ;` starting at token `end_idx`.
///
/// A name must sit on the same line as `END`. An `END` with no semicolon
/// terminates at the end of its line.
fn block_terminator(document: &str, tokens: &[Token], end_idx: usize) -> Option<usize> {
    let end_tok = tokens[end_idx];
    match tokens.get(end_idx + 1) {
        Some(next) if next.kind == TokenKind::Semicolon => Some(next.end),
        Some(next)
            if next.kind == TokenKind::Word
                && !document[end_tok.end..next.start].contains('\n') =>
        {
            match tokens.get(end_idx + 2) {
                Some(semi) if semi.kind == TokenKind::Semicolon => Some(semi.end),
                None => Some(next.end),
                Some(_) if next.is_keyword(document, "GO") => Some(end_tok.end),
                Some(_) => None,
            }
        }
        _ => Some(end_tok.end),
    }
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod tests;

//! Typed regions of a SQL document

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Kind of content a region holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Ordinary SQL statements
    Plain,
    /// Stored procedure/function or anonymous `BEGIN ... END;` block
    ProceduralBlock,
    /// Wrapper call whose string argument is SQL, e.g. `ZTC_SQLZZ('...');`
    DynamicCall,
    /// `/* ... */` comment
    CommentBlock,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Plain => "plain",
            RegionKind::ProceduralBlock => "procedural_block",
            RegionKind::DynamicCall => "dynamic_call",
            RegionKind::CommentBlock => "comment_block",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A span of a document with its kind.
///
/// `start..end` are byte offsets into the document the region was matched
/// in; `text` is exactly that substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub kind: RegionKind,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Region {
    /// Build a region from a span of `document`
    pub fn from_span(kind: RegionKind, document: &str, span: Range<usize>) -> Self {
        Self {
            kind,
            text: document[span.clone()].to_string(),
            start: span.start,
            end: span.end,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

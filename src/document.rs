//! Editable source text that keeps its tree in sync.

use std::fmt;

use crate::cst::Tree;
use crate::parser::{ParseOptions, parse_with_options};
use crate::token::Position;

/// Byte offsets of line starts, for converting between offsets and
/// 1-based line/column positions. Columns count characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset` in `text`. Offsets past the end clamp to the
    /// end; offsets inside a character resolve to that character.
    #[must_use]
    pub fn position(&self, text: &str, offset: usize) -> Position {
        self.cursor(text).position(offset)
    }

    /// Converter for many offsets at once. Feeding it ascending offsets
    /// walks the text once in total.
    #[must_use]
    pub const fn cursor<'a>(&'a self, text: &'a str) -> PositionCursor<'a> {
        PositionCursor {
            index: self,
            text,
            line: 0,
            byte: 0,
            column: 0,
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Byte offset of `position`, or `None` when the line does not exist
    /// or the column lies past the end of the line (the position just
    /// after the last character is allowed).
    #[must_use]
    pub fn offset(&self, text: &str, position: Position) -> Option<usize> {
        let line = position.line.checked_sub(1)?;
        let column = position.column.checked_sub(1)?;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(text.len(), |&next| next - 1);
        let line_text = text.get(start..end)?;
        let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
        if column == line_text.chars().count() {
            return Some(start + line_text.len());
        }
        line_text
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
    }
}

/// Offset to position conversion that resumes where the previous
/// lookup stopped. Moving backwards restarts from the line start.
#[derive(Debug, Clone)]
pub struct PositionCursor<'a> {
    index: &'a LineIndex,
    text: &'a str,
    line: usize,
    byte: usize,
    column: usize,
}

impl PositionCursor<'_> {
    pub fn position(&mut self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.index.line_of(offset);
        if line != self.line || offset < self.byte {
            self.line = line;
            self.byte = self.index.line_starts.get(line).copied().unwrap_or(0);
            self.column = 0;
        }
        for c in self.text.get(self.byte..).unwrap_or_default().chars() {
            if self.byte >= offset {
                break;
            }
            self.byte += c.len_utf8();
            self.column += 1;
        }
        Position::new(self.line + 1, self.column + 1)
    }
}

/// Half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Replace the text in `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub text: String,
}

impl TextEdit {
    #[must_use]
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Insert `text` at `position`.
    #[must_use]
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::new(Range::new(position, position), text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditErrorKind {
    OutOfBounds(Position),
    ReversedRange,
}

impl fmt::Display for EditErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds(position) => {
                write!(f, "position {position} is outside the document")
            }
            Self::ReversedRange => {
                write!(f, "range ends before it starts")
            }
        }
    }
}

/// An edit that could not be applied. The document is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (document version {version})")]
pub struct EditError {
    pub kind: EditErrorKind,
    pub version: u64,
}

/// Source text plus its current tree. Every successful change reparses
/// the whole text and bumps the version.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    tree: Tree,
    version: u64,
    options: ParseOptions,
}

impl Document {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_options(text, ParseOptions::default())
    }

    #[must_use]
    pub fn with_options(text: impl Into<String>, options: ParseOptions) -> Self {
        let text = text.into();
        let tree = parse_with_options(&text, options);
        Self {
            text,
            tree,
            version: 0,
            options,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole text.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.reparse();
    }

    pub fn apply_edit(&mut self, edit: &TextEdit) -> Result<(), EditError> {
        self.apply_edits(std::slice::from_ref(edit))
    }

    /// Apply edits in order, each against the text left by the previous
    /// one. Either all edits apply or none do.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<(), EditError> {
        let mut text = self.text.clone();
        for edit in edits {
            let (start, end) = self.resolve(&text, edit.range)?;
            text.replace_range(start..end, &edit.text);
        }
        log::debug!(
            "applied {} edits to document version {}",
            edits.len(),
            self.version
        );
        self.text = text;
        self.reparse();
        Ok(())
    }

    fn resolve(&self, text: &str, range: Range) -> Result<(usize, usize), EditError> {
        let lines = LineIndex::new(text);
        let offset = |position: Position| {
            lines.offset(text, position).ok_or(EditError {
                kind: EditErrorKind::OutOfBounds(position),
                version: self.version,
            })
        };
        let start = offset(range.start)?;
        let end = offset(range.end)?;
        if end < start {
            return Err(EditError {
                kind: EditErrorKind::ReversedRange,
                version: self.version,
            });
        }
        Ok((start, end))
    }

    fn reparse(&mut self) {
        self.tree = parse_with_options(&self.text, self.options);
        self.version += 1;
    }
}

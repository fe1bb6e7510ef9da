use std::fmt;

use serde::Serialize;

use crate::lexer::LexErrorKind;
use crate::parser::ParseErrorKind;
use crate::token::{Position, Span};

/// Where a diagnostic came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex(LexErrorKind),
    Parse(ParseErrorKind),
}

impl DiagnosticKind {
    /// Stable machine-readable code, e.g. `unterminated_string`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Lex(kind) => kind.code(),
            Self::Parse(kind) => kind.code(),
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(kind) => write!(f, "{kind}"),
            Self::Parse(kind) => write!(f, "{kind}"),
        }
    }
}

impl From<LexErrorKind> for DiagnosticKind {
    fn from(kind: LexErrorKind) -> Self {
        Self::Lex(kind)
    }
}

impl From<ParseErrorKind> for DiagnosticKind {
    fn from(kind: ParseErrorKind) -> Self {
        Self::Parse(kind)
    }
}

/// Syntax error recorded while building a tree. Every diagnostic
/// corresponds to an `ERROR`, `MISSING` or `error_recovery` node, or to
/// a `numeric_error` leaf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", position.line, position.column)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub position: Position,
}

impl Diagnostic {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Message without the location suffix.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Lex(_))
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Diagnostic", 5)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("span", &self.span)?;
        state.serialize_field("line", &self.position.line)?;
        state.serialize_field("column", &self.position.column)?;
        state.end()
    }
}

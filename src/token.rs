use std::fmt;

use serde::Serialize;

use crate::lexer::LexErrorKind;

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    #[must_use]
    pub const fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice `source` by this span, empty when out of range.
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Source location for error reporting, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Prefix letter in front of a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringPrefix {
    /// No prefix.
    Plain,
    /// `x"..."`: shell-expanded.
    Shell,
    /// `f"..."`: format string with `{{...}}` interpolations.
    Format,
}

/// Quote character of a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    /// `"`: escape sequences are processed.
    Double,
    /// `'`: raw, no escapes.
    Single,
}

/// One of the twelve string dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringKind {
    pub prefix: StringPrefix,
    pub quote: Quote,
    /// Triple-quoted form (`"""..."""`).
    pub indented: bool,
}

impl StringKind {
    /// Every dialect, plain first.
    pub const ALL: [Self; 12] = [
        Self::new(StringPrefix::Plain, Quote::Double, false),
        Self::new(StringPrefix::Plain, Quote::Double, true),
        Self::new(StringPrefix::Plain, Quote::Single, false),
        Self::new(StringPrefix::Plain, Quote::Single, true),
        Self::new(StringPrefix::Shell, Quote::Double, false),
        Self::new(StringPrefix::Shell, Quote::Double, true),
        Self::new(StringPrefix::Shell, Quote::Single, false),
        Self::new(StringPrefix::Shell, Quote::Single, true),
        Self::new(StringPrefix::Format, Quote::Double, false),
        Self::new(StringPrefix::Format, Quote::Double, true),
        Self::new(StringPrefix::Format, Quote::Single, false),
        Self::new(StringPrefix::Format, Quote::Single, true),
    ];

    #[must_use]
    pub const fn new(prefix: StringPrefix, quote: Quote, indented: bool) -> Self {
        Self {
            prefix,
            quote,
            indented,
        }
    }

    /// Escape sequences are only processed inside double quotes.
    #[must_use]
    pub const fn processes_escapes(self) -> bool {
        matches!(self.quote, Quote::Double)
    }

    #[must_use]
    pub const fn is_format(self) -> bool {
        matches!(self.prefix, StringPrefix::Format)
    }

    #[must_use]
    pub const fn is_shell_expanded(self) -> bool {
        matches!(self.prefix, StringPrefix::Shell)
    }

    #[must_use]
    pub const fn is_raw(self) -> bool {
        matches!(self.quote, Quote::Single)
    }

    /// Opening delimiter including the prefix letter.
    #[must_use]
    pub const fn opening(self) -> &'static str {
        match (self.prefix, self.quote, self.indented) {
            (StringPrefix::Plain, Quote::Double, false) => "\"",
            (StringPrefix::Plain, Quote::Double, true) => "\"\"\"",
            (StringPrefix::Plain, Quote::Single, false) => "'",
            (StringPrefix::Plain, Quote::Single, true) => "'''",
            (StringPrefix::Shell, Quote::Double, false) => "x\"",
            (StringPrefix::Shell, Quote::Double, true) => "x\"\"\"",
            (StringPrefix::Shell, Quote::Single, false) => "x'",
            (StringPrefix::Shell, Quote::Single, true) => "x'''",
            (StringPrefix::Format, Quote::Double, false) => "f\"",
            (StringPrefix::Format, Quote::Double, true) => "f\"\"\"",
            (StringPrefix::Format, Quote::Single, false) => "f'",
            (StringPrefix::Format, Quote::Single, true) => "f'''",
        }
    }

    #[must_use]
    pub const fn closing(self) -> &'static str {
        match (self.quote, self.indented) {
            (Quote::Double, false) => "\"",
            (Quote::Double, true) => "\"\"\"",
            (Quote::Single, false) => "'",
            (Quote::Single, true) => "'''",
        }
    }

    /// Recognise the dialect whose opening delimiter starts `text`,
    /// preferring the triple-quoted form.
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let (prefix, rest) = match text.as_bytes().first() {
            Some(b'x') => (StringPrefix::Shell, &text[1..]),
            Some(b'f') => (StringPrefix::Format, &text[1..]),
            _ => (StringPrefix::Plain, text),
        };
        let quote = match rest.as_bytes().first() {
            Some(b'"') => Quote::Double,
            Some(b'\'') => Quote::Single,
            _ => return None,
        };
        let indented = match quote {
            Quote::Double => rest.starts_with("\"\"\""),
            Quote::Single => rest.starts_with("'''"),
        };
        Some(Self::new(prefix, quote, indented))
    }
}

/// Contextual keywords. The scanner emits identifiers; the parser
/// re-tags them when it consumes them in keyword position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Alias,
    Else,
    Env,
    Export,
    False,
    If,
    Import,
    Mod,
    Set,
    True,
    Unexport,
}

impl Keyword {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::Else => "else",
            Self::Env => "env",
            Self::Export => "export",
            Self::False => "false",
            Self::If => "if",
            Self::Import => "import",
            Self::Mod => "mod",
            Self::Set => "set",
            Self::True => "true",
            Self::Unexport => "unexport",
        }
    }
}

/// Token kinds produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Spaces and tabs; also blank lines ahead of a recipe body.
    Whitespace,
    /// `# ...` to end of line.
    Comment,
    /// Backslash, optional trailing blanks, newline.
    LineContinuation,
    Newline,
    /// Zero-width: a recipe body opens.
    Indent,
    /// Zero-width: a recipe body closes.
    Dedent,
    Eof,

    /// Verbatim recipe body text.
    Text,
    /// `@`, `-`, `@-` or `-@` at the start of a body line.
    LinePrefix,

    StringStart(StringKind),
    StringContent,
    EscapeSequence,
    StringEnd(StringKind),
    CommandStart { indented: bool },
    CommandContent,
    CommandEnd { indented: bool },
    InterpolationStart,
    InterpolationEnd,

    Identifier,
    /// Bare number; never a valid value.
    Number,
    Keyword(Keyword),

    ColonEquals,
    DoubleColon,
    Colon,
    EqualsEquals,
    BangEquals,
    EqualsTilde,
    Equals,
    AmpAmp,
    ParenL,
    ParenR,
    BracketL,
    BracketR,
    BraceL,
    BraceR,
    Comma,
    Plus,
    Slash,
    Star,
    At,
    Dollar,
    Question,

    /// `#!`
    ShebangStart,
    /// Interpreter directory, up to and including the last `/`.
    ShebangPath,
    /// `-...` flag passed to `env`.
    ShebangFlag,
    /// Interpreter name extracted from the shebang.
    Language,
    /// Remainder of a shebang line.
    ShebangRest,

    /// Input the scanner could not make progress on.
    ErrorRecovery(LexErrorKind),
}

impl TokenKind {
    /// Stable name: the literal text for punctuation and keywords, a
    /// fixed snake-case word otherwise.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
            Self::LineContinuation => "line_continuation",
            Self::Newline => "newline",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Eof => "eof",
            Self::Text => "text",
            Self::LinePrefix => "recipe_line_prefix",
            Self::StringStart(kind) => kind.opening(),
            Self::StringEnd(kind) => kind.closing(),
            Self::StringContent => "string_content",
            Self::EscapeSequence => "escape_sequence",
            Self::CommandStart { indented } | Self::CommandEnd { indented } => {
                if indented {
                    "```"
                } else {
                    "`"
                }
            }
            Self::CommandContent => "command_content",
            Self::InterpolationStart => "{{",
            Self::InterpolationEnd => "}}",
            Self::Identifier => "identifier",
            Self::Number => "numeric_error",
            Self::Keyword(keyword) => keyword.as_str(),
            Self::ColonEquals => ":=",
            Self::DoubleColon => "::",
            Self::Colon => ":",
            Self::EqualsEquals => "==",
            Self::BangEquals => "!=",
            Self::EqualsTilde => "=~",
            Self::Equals => "=",
            Self::AmpAmp => "&&",
            Self::ParenL => "(",
            Self::ParenR => ")",
            Self::BracketL => "[",
            Self::BracketR => "]",
            Self::BraceL => "{",
            Self::BraceR => "}",
            Self::Comma => ",",
            Self::Plus => "+",
            Self::Slash => "/",
            Self::Star => "*",
            Self::At => "@",
            Self::Dollar => "$",
            Self::Question => "?",
            Self::ShebangStart => "#!",
            Self::ShebangPath => "shebang_path",
            Self::ShebangFlag => "shebang_flag",
            Self::Language => "language",
            Self::ShebangRest => "shebang_rest",
            Self::ErrorRecovery(_) => "error_recovery",
        }
    }

    /// Tokens the parser never sees as significant.
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::Comment | Self::LineContinuation
        )
    }

    /// Whether the token opens a value.
    #[must_use]
    pub const fn starts_value(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::Number
                | Self::StringStart(_)
                | Self::CommandStart { .. }
                | Self::ParenL
        )
    }

    /// Whether a missing value should be reported here instead of
    /// consuming the token as garbage.
    #[must_use]
    pub const fn ends_value(self) -> bool {
        matches!(
            self,
            Self::Newline
                | Self::Eof
                | Self::Dedent
                | Self::ParenR
                | Self::BracketR
                | Self::BraceR
                | Self::BraceL
                | Self::Comma
                | Self::Colon
                | Self::InterpolationEnd
                | Self::EqualsEquals
                | Self::BangEquals
                | Self::EqualsTilde
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace
            | Self::Comment
            | Self::LineContinuation
            | Self::Text
            | Self::StringContent
            | Self::EscapeSequence
            | Self::CommandContent
            | Self::Identifier
            | Self::ShebangPath
            | Self::ShebangFlag
            | Self::Language
            | Self::ShebangRest => write!(f, "{}", self.as_str().replace('_', " ")),
            Self::Newline => write!(f, "end of line"),
            Self::Indent => write!(f, "indentation"),
            Self::Dedent => write!(f, "end of recipe body"),
            Self::Eof => write!(f, "end of input"),
            Self::LinePrefix => write!(f, "line prefix"),
            Self::Number => write!(f, "number"),
            Self::ErrorRecovery(kind) => write!(f, "{kind}"),
            _ => write!(f, "'{}'", self.as_str()),
        }
    }
}

/// A single token with its kind and byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Indentation width pushed by an `Indent`, or left on top of the
    /// stack by a `Dedent`.
    pub indent: Option<usize>,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            indent: None,
        }
    }

    #[must_use]
    pub fn text(self, source: &str) -> &str {
        self.span.text(source)
    }
}

impl Serialize for Token {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Token", 3)?;
        state.serialize_field("kind", self.kind.as_str())?;
        state.serialize_field("span", &self.span)?;
        if let Some(indent) = self.indent {
            state.serialize_field("indent", &indent)?;
        } else {
            state.skip_field("indent")?;
        }
        state.end()
    }
}

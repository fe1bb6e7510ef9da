use std::collections::VecDeque;
use std::fmt;

use crate::token::{Keyword, Span, StringKind, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    /// String literal reached end of input before its closing delimiter.
    UnterminatedString,
    /// Backtick command reached end of input before its closing delimiter.
    UnterminatedCommand,
    /// A recipe body line dedented to a width no enclosing level uses.
    /// `body` is the width of the body being left, `enclosing` the
    /// level it fell back to.
    DedentMismatch {
        body: usize,
        enclosing: usize,
        found: usize,
    },
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
}

impl LexErrorKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnterminatedString => "unterminated_string",
            Self::UnterminatedCommand => "unterminated_command",
            Self::DedentMismatch { .. } => "dedent_mismatch",
            Self::UnexpectedCharacter(_) => "unexpected_character",
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            Self::UnterminatedCommand => {
                write!(f, "unterminated backtick command")
            }
            Self::DedentMismatch {
                body,
                enclosing,
                found,
            } => {
                write!(
                    f,
                    "inconsistent indentation: \
                     found width {found}, expected {body} or {enclosing}"
                )
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch:?}")
            }
        }
    }
}

/// What the parser expects next; selects how raw input is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Item level and expressions.
    Normal,
    /// Right after a recipe header: a deeper line opens a body.
    BodyStart,
    /// Inside a recipe body.
    Body,
    /// Between the delimiters of a string literal.
    StringContent(StringKind),
    /// Between the backticks of a command.
    CommandContent { indented: bool },
}

/// Tokenize a justfile by running the parser and collecting every
/// token it consumed, trivia included, in source order.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    crate::parser::parse_recording(input, crate::parser::ParseOptions::default()).1
}

/// Everything the scanner carries between calls. Cloning it is enough
/// to rewind the scanner to an earlier token boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerState {
    pos: usize,
    indents: Vec<usize>,
    queued: VecDeque<Token>,
    pending_dedents: usize,
    pending_mismatch: Option<LexErrorKind>,
    line_content: Option<usize>,
    first_body_line: bool,
    /// The string or backtick being scanned has been closed or reported
    /// as unterminated; content modes then yield `Eof` at end of input.
    literal_closed: bool,
}

/// Mode-driven scanner. Produces one token per call; the caller picks
/// the mode from its parse state.
///
/// The indentation stack starts as `[0]`, is strictly increasing and
/// never drops below its base.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    input: &'a [u8],
    start: usize,
    state: ScannerState,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let input = source.as_bytes();
        let start = if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            source,
            input,
            start,
            state: ScannerState {
                pos: 0,
                indents: vec![0],
                queued: VecDeque::new(),
                pending_dedents: 0,
                pending_mismatch: None,
                line_content: None,
                first_body_line: false,
                literal_closed: false,
            },
        }
    }

    /// Byte offset of the next token.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.state.pos
    }

    #[must_use]
    pub fn indentation_stack(&self) -> &[usize] {
        &self.state.indents
    }

    #[must_use]
    pub fn snapshot(&self) -> ScannerState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: ScannerState) {
        self.state = state;
    }

    /// Produce the next token in `mode`. Total: malformed input yields
    /// `ErrorRecovery` tokens, end of input yields `Eof` forever.
    pub fn next_token(&mut self, mode: LexMode) -> Token {
        if let Some(token) = self.state.queued.pop_front() {
            return token;
        }
        if self.state.pos < self.start {
            return self.emit(TokenKind::Whitespace, self.start);
        }
        if self.state.pending_dedents > 0 {
            self.state.pending_dedents -= 1;
            return self.dedent_token();
        }
        if let Some(kind) = self.state.pending_mismatch.take() {
            let end = self.line_end(self.state.pos);
            return self.emit(TokenKind::ErrorRecovery(kind), end);
        }

        match mode {
            LexMode::Normal => self.normal(),
            LexMode::BodyStart => self.body_start(),
            LexMode::Body => self.body(),
            LexMode::StringContent(kind) => self.string_content(kind),
            LexMode::CommandContent { indented } => self.command_content(indented),
        }
    }

    fn top(&self) -> usize {
        self.state.indents.last().copied().unwrap_or(0)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.state.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.state.pos + offset).copied()
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.input.get(at).copied()
    }

    fn looking_at(&self, at: usize, literal: &str) -> bool {
        self.input
            .get(at..)
            .is_some_and(|rest| rest.starts_with(literal.as_bytes()))
    }

    fn emit(&mut self, kind: TokenKind, end: usize) -> Token {
        let token = Token::new(kind, Span::new(self.state.pos, end));
        self.state.pos = end;
        token
    }

    fn emit_len(&mut self, kind: TokenKind, len: usize) -> Token {
        self.emit(kind, self.state.pos + len)
    }

    fn dedent_token(&self) -> Token {
        Token {
            kind: TokenKind::Dedent,
            span: Span::empty(self.state.pos),
            indent: Some(self.top()),
        }
    }

    fn newline_len(&self, at: usize) -> Option<usize> {
        match (self.byte(at), self.byte(at + 1)) {
            (Some(b'\n'), _) => Some(1),
            (Some(b'\r'), Some(b'\n')) => Some(2),
            _ => None,
        }
    }

    fn is_line_end(&self, at: usize) -> bool {
        at >= self.input.len() || self.newline_len(at).is_some()
    }

    fn line_end(&self, from: usize) -> usize {
        (from..self.input.len())
            .find(|&at| self.newline_len(at).is_some())
            .unwrap_or(self.input.len())
    }

    fn at_line_start(&self, at: usize) -> bool {
        at == self.start || self.byte(at.wrapping_sub(1)) == Some(b'\n')
    }

    fn indentation(&self, at: usize) -> usize {
        self.input
            .get(at..)
            .map_or(0, |rest| rest.iter().take_while(|b| matches!(b, b' ' | b'\t')).count())
    }

    fn blanks_end(&self, from: usize, limit: usize) -> usize {
        (from..limit)
            .find(|&at| !matches!(self.input[at], b' ' | b'\t'))
            .unwrap_or(limit)
    }

    fn word_end(&self, from: usize, limit: usize) -> usize {
        (from..limit)
            .find(|&at| matches!(self.input[at], b' ' | b'\t'))
            .unwrap_or(limit)
    }

    fn identifier_len(&self, at: usize) -> usize {
        match self.byte(at) {
            Some(c) if is_identifier_start(c) => {}
            _ => return 0,
        }
        let mut end = at + 1;
        while self.byte(end).is_some_and(is_identifier_continue) {
            end += 1;
        }
        end - at
    }

    /// Backslash, optional blanks, then a line break.
    fn continuation_len(&self, at: usize) -> Option<usize> {
        if self.byte(at) != Some(b'\\') {
            return None;
        }
        let blanks = self.blanks_end(at + 1, self.input.len());
        self.newline_len(blanks).map(|nl| blanks + nl - at)
    }

    fn escape_len(&self, at: usize) -> Option<usize> {
        if self.byte(at) != Some(b'\\') {
            return None;
        }
        match (self.byte(at + 1), self.byte(at + 2)) {
            (Some(b'n' | b'r' | b't' | b'"' | b'\\' | b'\n'), _) => Some(2),
            (Some(b'\r'), Some(b'\n')) => Some(3),
            _ => None,
        }
    }

    fn line_prefix_len(&self, at: usize) -> Option<usize> {
        if self.looking_at(at, "@-") || self.looking_at(at, "-@") {
            Some(2)
        } else if matches!(self.byte(at), Some(b'@' | b'-')) {
            Some(1)
        } else {
            None
        }
    }

    fn normal(&mut self) -> Token {
        let pos = self.state.pos;
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::empty(pos));
        };
        if pos == self.start && self.looking_at(pos, "#!") {
            return self.shebang();
        }
        if let Some(len) = self.newline_len(pos) {
            return self.emit_len(TokenKind::Newline, len);
        }

        match ch {
            b' ' | b'\t' | b'\r' => {
                let mut end = pos;
                while matches!(self.byte(end), Some(b' ' | b'\t' | b'\r'))
                    && self.newline_len(end).is_none()
                {
                    end += 1;
                }
                self.emit(TokenKind::Whitespace, end)
            }
            b'#' => {
                let end = self.line_end(pos);
                self.emit(TokenKind::Comment, end)
            }
            b'\\' => match self.continuation_len(pos) {
                Some(len) => self.emit_len(TokenKind::LineContinuation, len),
                None => self.unexpected(),
            },
            b'"' | b'\'' => self.string_start(),
            b'x' | b'f' if matches!(self.peek_at(1), Some(b'"' | b'\'')) => self.string_start(),
            b'`' => {
                let indented = self.looking_at(pos, "```");
                let len = if indented { 3 } else { 1 };
                self.state.literal_closed = false;
                self.emit_len(TokenKind::CommandStart { indented }, len)
            }
            b'0'..=b'9' => self.number(),
            c if is_identifier_start(c) => {
                let len = self.identifier_len(pos);
                self.emit_len(TokenKind::Identifier, len)
            }
            b':' => match self.peek_at(1) {
                Some(b':') => self.emit_len(TokenKind::DoubleColon, 2),
                Some(b'=') => self.emit_len(TokenKind::ColonEquals, 2),
                _ => self.emit_len(TokenKind::Colon, 1),
            },
            b'=' => match self.peek_at(1) {
                Some(b'=') => self.emit_len(TokenKind::EqualsEquals, 2),
                Some(b'~') => self.emit_len(TokenKind::EqualsTilde, 2),
                _ => self.emit_len(TokenKind::Equals, 1),
            },
            b'!' if self.peek_at(1) == Some(b'=') => self.emit_len(TokenKind::BangEquals, 2),
            b'&' if self.peek_at(1) == Some(b'&') => self.emit_len(TokenKind::AmpAmp, 2),
            b'(' => self.emit_len(TokenKind::ParenL, 1),
            b')' => self.emit_len(TokenKind::ParenR, 1),
            b'[' => self.emit_len(TokenKind::BracketL, 1),
            b']' => self.emit_len(TokenKind::BracketR, 1),
            b'{' => self.emit_len(TokenKind::BraceL, 1),
            b'}' => self.emit_len(TokenKind::BraceR, 1),
            b',' => self.emit_len(TokenKind::Comma, 1),
            b'+' => self.emit_len(TokenKind::Plus, 1),
            b'/' => self.emit_len(TokenKind::Slash, 1),
            b'*' => self.emit_len(TokenKind::Star, 1),
            b'@' => self.emit_len(TokenKind::At, 1),
            b'$' => self.emit_len(TokenKind::Dollar, 1),
            b'?' => self.emit_len(TokenKind::Question, 1),
            _ => self.unexpected(),
        }
    }

    fn unexpected(&mut self) -> Token {
        let ch = self
            .source
            .get(self.state.pos..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.emit_len(
            TokenKind::ErrorRecovery(LexErrorKind::UnexpectedCharacter(ch)),
            ch.len_utf8(),
        )
    }

    fn number(&mut self) -> Token {
        let mut end = self.state.pos;
        while self.byte(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        if self.byte(end) == Some(b'.') {
            end += 1;
            while self.byte(end).is_some_and(|b| b.is_ascii_digit()) {
                end += 1;
            }
        }
        self.emit(TokenKind::Number, end)
    }

    fn string_start(&mut self) -> Token {
        let rest = self.source.get(self.state.pos..).unwrap_or_default();
        match StringKind::detect(rest) {
            Some(kind) => {
                self.state.literal_closed = false;
                self.emit_len(TokenKind::StringStart(kind), kind.opening().len())
            }
            None => self.unexpected(),
        }
    }

    fn string_content(&mut self, kind: StringKind) -> Token {
        let pos = self.state.pos;
        let closing = kind.closing();
        if self.looking_at(pos, closing) {
            self.state.literal_closed = true;
            return self.emit_len(TokenKind::StringEnd(kind), closing.len());
        }
        if pos >= self.input.len() {
            return self.unterminated(LexErrorKind::UnterminatedString, pos);
        }
        if kind.processes_escapes() {
            if let Some(len) = self.escape_len(pos) {
                return self.emit_len(TokenKind::EscapeSequence, len);
            }
        }
        if kind.is_format() && self.opens_interpolation(pos) {
            return self.emit_len(TokenKind::InterpolationStart, 2);
        }

        let mut end = pos;
        loop {
            if end >= self.input.len() {
                return self.unterminated(LexErrorKind::UnterminatedString, end);
            }
            if self.looking_at(end, closing) {
                break;
            }
            if kind.processes_escapes() && self.byte(end) == Some(b'\\') {
                if self.escape_len(end).is_some() {
                    break;
                }
                end += 1;
                continue;
            }
            if kind.is_format() && self.looking_at(end, "{{{{") {
                end += 4;
                continue;
            }
            if kind.is_format() && self.looking_at(end, "{{") {
                break;
            }
            end += 1;
        }
        self.emit(TokenKind::StringContent, end)
    }

    fn command_content(&mut self, indented: bool) -> Token {
        let pos = self.state.pos;
        let closing = if indented { "```" } else { "`" };
        if self.looking_at(pos, closing) {
            self.state.literal_closed = true;
            return self.emit_len(TokenKind::CommandEnd { indented }, closing.len());
        }
        if pos >= self.input.len() {
            return self.unterminated(LexErrorKind::UnterminatedCommand, pos);
        }
        if self.opens_interpolation(pos) {
            return self.emit_len(TokenKind::InterpolationStart, 2);
        }

        let mut end = pos;
        loop {
            if end >= self.input.len() {
                return self.unterminated(LexErrorKind::UnterminatedCommand, end);
            }
            if self.looking_at(end, closing) {
                break;
            }
            if self.looking_at(end, "{{{{") {
                end += 4;
                continue;
            }
            if self.looking_at(end, "{{") {
                break;
            }
            end += 1;
        }
        self.emit(TokenKind::CommandContent, end)
    }

    /// Report an open literal running into end of input, once. Later
    /// calls at the end yield `Eof`.
    fn unterminated(&mut self, kind: LexErrorKind, end: usize) -> Token {
        let reported = std::mem::replace(&mut self.state.literal_closed, true);
        if reported && self.state.pos >= self.input.len() {
            return Token::new(TokenKind::Eof, Span::empty(self.state.pos));
        }
        self.emit(TokenKind::ErrorRecovery(kind), end)
    }

    /// `{{` opens an interpolation unless doubled as `{{{{`.
    fn opens_interpolation(&self, at: usize) -> bool {
        self.looking_at(at, "{{") && !self.looking_at(at, "{{{{")
    }

    fn body_start(&mut self) -> Token {
        let pos = self.state.pos;
        let blank_end = self.blank_lines_end(pos);
        if blank_end > pos {
            return self.emit(TokenKind::Whitespace, blank_end);
        }
        let width = self.indentation(pos);
        if width > self.top() && !self.is_line_end(pos + width) {
            self.state.indents.push(width);
            self.state.first_body_line = true;
            return Token {
                kind: TokenKind::Indent,
                span: Span::empty(pos),
                indent: Some(width),
            };
        }
        self.normal()
    }

    fn blank_lines_end(&self, from: usize) -> usize {
        let mut at = from;
        loop {
            let after = at + self.indentation(at);
            if let Some(nl) = self.newline_len(after) {
                at = after + nl;
            } else {
                if after >= self.input.len() {
                    at = after;
                }
                return at;
            }
        }
    }

    fn body(&mut self) -> Token {
        let pos = self.state.pos;
        if pos >= self.input.len() {
            if self.state.indents.len() > 1 {
                self.state.indents.pop();
                return self.dedent_token();
            }
            return Token::new(TokenKind::Eof, Span::empty(pos));
        }

        if self.at_line_start(pos) {
            let width = self.indentation(pos);
            let after = pos + width;
            if self.is_line_end(after) {
                if width > 0 {
                    return self.emit(TokenKind::Whitespace, after);
                }
            } else if width < self.top() {
                return self.dedent_to(width);
            } else {
                let top = self.top();
                self.state.line_content = Some(pos + top);
                if top > 0 {
                    return self.emit(TokenKind::Whitespace, pos + top);
                }
            }
        }

        if self.state.line_content == Some(pos) {
            self.state.line_content = None;
            if std::mem::take(&mut self.state.first_body_line) && self.looking_at(pos, "#!") {
                return self.shebang();
            }
            if let Some(len) = self.line_prefix_len(pos) {
                return self.emit_len(TokenKind::LinePrefix, len);
            }
        }

        if let Some(len) = self.newline_len(pos) {
            return self.emit_len(TokenKind::Newline, len);
        }
        if self.opens_interpolation(pos) {
            return self.emit_len(TokenKind::InterpolationStart, 2);
        }
        self.text()
    }

    fn dedent_to(&mut self, width: usize) -> Token {
        let body = self.top();
        let mut pops = 0_usize;
        while self.state.indents.len() > 1 && width < self.top() {
            self.state.indents.pop();
            pops += 1;
        }
        if width != self.top() {
            self.state.pending_mismatch = Some(LexErrorKind::DedentMismatch {
                body,
                enclosing: self.top(),
                found: width,
            });
        }
        self.state.pending_dedents = pops.saturating_sub(1);
        self.dedent_token()
    }

    /// Body text up to the line break or an interpolation. An odd run of
    /// backslashes before the break continues the text onto the next line.
    fn text(&mut self) -> Token {
        let mut end = self.state.pos;
        while end < self.input.len() {
            if self.newline_len(end).is_some() {
                break;
            }
            if self.looking_at(end, "{{{{") {
                end += 4;
                continue;
            }
            if self.looking_at(end, "{{") {
                break;
            }
            if self.byte(end) == Some(b'\\') {
                let run = self.input[end..]
                    .iter()
                    .take_while(|&&b| b == b'\\')
                    .count();
                let last = end + run - 1;
                end += run;
                if run % 2 == 1 {
                    if let Some(len) = self.continuation_len(last) {
                        end = last + len;
                    }
                }
                continue;
            }
            end += 1;
        }
        self.emit(TokenKind::Text, end)
    }

    fn shebang(&mut self) -> Token {
        let start = self.state.pos;
        let end = self.line_end(start);
        let first = Token::new(TokenKind::ShebangStart, Span::new(start, start + 2));
        let mut parts = VecDeque::new();

        let mut at = self.blanks_end(start + 2, end);
        if at > start + 2 {
            parts.push_back(Token::new(
                TokenKind::Whitespace,
                Span::new(start + 2, at),
            ));
        }
        if let Some((language, next)) = self.shebang_language(at, end) {
            parts.extend(language);
            at = next;
        }
        if at < end {
            parts.push_back(Token::new(TokenKind::ShebangRest, Span::new(at, end)));
        }

        self.state.pos = end;
        self.state.queued.extend(parts);
        first
    }

    /// `path/` then either `env [-flags] language` or `language`.
    fn shebang_language(&self, from: usize, end: usize) -> Option<(Vec<Token>, usize)> {
        let word_end = self.word_end(from, end);
        let slash = (from..word_end).rev().find(|&at| self.input[at] == b'/')?;
        let mut parts = vec![Token::new(
            TokenKind::ShebangPath,
            Span::new(from, slash + 1),
        )];

        let name = slash + 1;
        let name_end = name + self.identifier_len(name);
        if name_end == name || name_end > end {
            return None;
        }
        if self.input.get(name..name_end) != Some(b"env".as_slice()) {
            parts.push(Token::new(TokenKind::Language, Span::new(name, name_end)));
            return Some((parts, name_end));
        }

        let mut env = vec![Token::new(
            TokenKind::Keyword(Keyword::Env),
            Span::new(name, name_end),
        )];
        let mut at = self.push_blanks(&mut env, name_end, end);
        let mut flags = 0;
        while at < end && self.byte(at) == Some(b'-') {
            let flag_end = self.word_end(at, end);
            env.push(Token::new(TokenKind::ShebangFlag, Span::new(at, flag_end)));
            flags += 1;
            at = self.push_blanks(&mut env, flag_end, end);
        }

        let language_end = at + self.identifier_len(at);
        if language_end > at && language_end <= end {
            parts.extend(env);
            parts.push(Token::new(TokenKind::Language, Span::new(at, language_end)));
            Some((parts, language_end))
        } else if flags == 0 {
            parts.push(Token::new(TokenKind::Language, Span::new(name, name_end)));
            Some((parts, name_end))
        } else {
            None
        }
    }

    fn push_blanks(&self, parts: &mut Vec<Token>, from: usize, end: usize) -> usize {
        let to = self.blanks_end(from, end);
        if to > from {
            parts.push(Token::new(TokenKind::Whitespace, Span::new(from, to)));
        }
        to
    }
}

const fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

const fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Quote, StringPrefix};

    fn scan(input: &str, mode: LexMode) -> Vec<Token> {
        let mut scanner = Scanner::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token(mode);
            if token.kind == TokenKind::Eof {
                return tokens;
            }
            tokens.push(token);
        }
    }

    fn kinds(input: &str, mode: LexMode) -> Vec<TokenKind> {
        scan(input, mode).into_iter().map(|t| t.kind).collect()
    }

    const DOUBLE: StringKind = StringKind::new(StringPrefix::Plain, Quote::Double, false);
    const RAW: StringKind = StringKind::new(StringPrefix::Plain, Quote::Single, false);
    const FORMAT: StringKind = StringKind::new(StringPrefix::Format, Quote::Double, false);

    #[test]
    fn assignment_tokens() {
        let kinds = kinds("foo := bar", LexMode::Normal);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::ColonEquals,
                TokenKind::Whitespace,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn compound_punctuation() {
        let kinds: Vec<_> = kinds("== != =~ = :: := : && $ ? @", LexMode::Normal)
            .into_iter()
            .filter(|k| *k != TokenKind::Whitespace)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqualsEquals,
                TokenKind::BangEquals,
                TokenKind::EqualsTilde,
                TokenKind::Equals,
                TokenKind::DoubleColon,
                TokenKind::ColonEquals,
                TokenKind::Colon,
                TokenKind::AmpAmp,
                TokenKind::Dollar,
                TokenKind::Question,
                TokenKind::At,
            ]
        );
    }

    #[test]
    fn identifiers_allow_dashes() {
        let tokens = scan("build-all_2", LexMode::Normal);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].span, Span::new(0, 11));
    }

    #[test]
    fn numbers() {
        let tokens = scan("12.5 7", LexMode::Normal);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].span, Span::new(0, 4));
        assert_eq!(tokens[2].span, Span::new(5, 6));
    }

    #[test]
    fn comment_runs_to_line_end() {
        let tokens = scan("a # note\nb", LexMode::Normal);
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[2].span, Span::new(2, 8));
        assert_eq!(tokens[3].kind, TokenKind::Newline);
    }

    #[test]
    fn crlf_is_one_newline() {
        let tokens = scan("a\r\nb", LexMode::Normal);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[1].span, Span::new(1, 3));
    }

    #[test]
    fn line_continuation_is_trivia() {
        let tokens = scan("a \\  \nb", LexMode::Normal);
        assert_eq!(tokens[2].kind, TokenKind::LineContinuation);
        assert_eq!(tokens[2].span, Span::new(2, 6));
    }

    #[test]
    fn string_openings() {
        for kind in StringKind::ALL {
            let tokens = scan(kind.opening(), LexMode::Normal);
            assert_eq!(tokens[0].kind, TokenKind::StringStart(kind), "{}", kind.opening());
            assert_eq!(tokens[0].span.len(), kind.opening().len());
        }
    }

    #[test]
    fn backtick_openings() {
        assert_eq!(
            kinds("```", LexMode::Normal),
            vec![TokenKind::CommandStart { indented: true }]
        );
        assert_eq!(
            kinds("`", LexMode::Normal),
            vec![TokenKind::CommandStart { indented: false }]
        );
    }

    #[test]
    fn unexpected_character() {
        let tokens = scan("a ! b", LexMode::Normal);
        assert_eq!(
            tokens[2].kind,
            TokenKind::ErrorRecovery(LexErrorKind::UnexpectedCharacter('!'))
        );
    }

    #[test]
    fn unexpected_multibyte_character() {
        let tokens = scan("é", LexMode::Normal);
        assert_eq!(tokens[0].span, Span::new(0, 2));
    }

    #[test]
    fn bom_is_whitespace() {
        let tokens = scan("\u{FEFF}x", LexMode::Normal);
        assert_eq!(tokens[0].kind, TokenKind::Whitespace);
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn escapes_in_double_quotes() {
        let tokens = scan("a\\n\\\"b\"", LexMode::StringContent(DOUBLE));
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StringContent,
                TokenKind::EscapeSequence,
                TokenKind::EscapeSequence,
                TokenKind::StringContent,
                TokenKind::StringEnd(DOUBLE),
            ]
        );
    }

    #[test]
    fn unknown_escape_is_content() {
        let tokens = scan("a\\qb\"", LexMode::StringContent(DOUBLE));
        assert_eq!(tokens[0].kind, TokenKind::StringContent);
        assert_eq!(tokens[0].span, Span::new(0, 4));
    }

    #[test]
    fn raw_strings_have_no_escapes() {
        let tokens = scan("a\\nb'", LexMode::StringContent(RAW));
        assert_eq!(tokens[0].kind, TokenKind::StringContent);
        assert_eq!(tokens[0].span, Span::new(0, 4));
        assert_eq!(tokens[1].kind, TokenKind::StringEnd(RAW));
    }

    #[test]
    fn format_string_interpolation() {
        let kinds = kinds("a {{b", LexMode::StringContent(FORMAT));
        assert_eq!(kinds[0], TokenKind::StringContent);
        assert_eq!(kinds[1], TokenKind::InterpolationStart);
    }

    #[test]
    fn quadruple_brace_is_literal() {
        let tokens = scan("a {{{{b\"", LexMode::StringContent(FORMAT));
        assert_eq!(tokens[0].kind, TokenKind::StringContent);
        assert_eq!(tokens[0].span, Span::new(0, 7));
    }

    #[test]
    fn unterminated_string() {
        let tokens = scan("abc", LexMode::StringContent(DOUBLE));
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].kind,
            TokenKind::ErrorRecovery(LexErrorKind::UnterminatedString)
        );
        assert_eq!(tokens[0].span, Span::new(0, 3));
    }

    #[test]
    fn command_content_and_end() {
        let kinds = kinds("ls {{dir}}`", LexMode::CommandContent { indented: false });
        assert_eq!(kinds[0], TokenKind::CommandContent);
        assert_eq!(kinds[1], TokenKind::InterpolationStart);
    }

    #[test]
    fn unterminated_command() {
        let kinds = kinds("ls", LexMode::CommandContent { indented: true });
        assert_eq!(
            kinds,
            vec![TokenKind::ErrorRecovery(LexErrorKind::UnterminatedCommand)]
        );
    }

    #[test]
    fn literal_at_end_of_input_reports_once_then_eof() {
        for mode in [
            LexMode::StringContent(DOUBLE),
            LexMode::CommandContent { indented: false },
        ] {
            let mut scanner = Scanner::new("");
            let first = scanner.next_token(mode);
            assert!(matches!(first.kind, TokenKind::ErrorRecovery(_)), "{mode:?}");
            assert_eq!(first.span, Span::empty(0));
            for _ in 0..3 {
                assert_eq!(scanner.next_token(mode).kind, TokenKind::Eof, "{mode:?}");
            }
        }
    }

    #[test]
    fn closed_literal_ends_with_eof() {
        let mut scanner = Scanner::new("a'");
        let kinds: Vec<_> = (0..4)
            .map(|_| scanner.next_token(LexMode::StringContent(RAW)).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StringContent,
                TokenKind::StringEnd(RAW),
                TokenKind::Eof,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn recipe_body_layout() {
        let mut scanner = Scanner::new("a:\n  echo hi\n\nb");
        let header: Vec<_> = (0..3)
            .map(|_| scanner.next_token(LexMode::Normal).kind)
            .collect();
        assert_eq!(
            header,
            vec![TokenKind::Identifier, TokenKind::Colon, TokenKind::Newline]
        );

        let indent = scanner.next_token(LexMode::BodyStart);
        assert_eq!(indent.kind, TokenKind::Indent);
        assert_eq!(indent.indent, Some(2));
        assert_eq!(scanner.indentation_stack(), &[0, 2]);

        let body: Vec<_> = (0..5).map(|_| scanner.next_token(LexMode::Body)).collect();
        let kinds: Vec<_> = body.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Whitespace,
                TokenKind::Text,
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Dedent,
            ]
        );
        assert_eq!(body[1].span, Span::new(5, 12));
        assert_eq!(scanner.indentation_stack(), &[0]);
        assert_eq!(scanner.next_token(LexMode::Normal).kind, TokenKind::Identifier);
    }

    #[test]
    fn no_body_without_deeper_line() {
        let mut scanner = Scanner::new("b");
        assert_eq!(
            scanner.next_token(LexMode::BodyStart).kind,
            TokenKind::Identifier
        );
        assert_eq!(scanner.indentation_stack(), &[0]);
    }

    #[test]
    fn deeper_lines_are_text() {
        let mut scanner = Scanner::new("  a\n    b\n");
        assert_eq!(scanner.next_token(LexMode::BodyStart).kind, TokenKind::Indent);
        let tokens: Vec<_> = (0..6).map(|_| scanner.next_token(LexMode::Body)).collect();
        assert_eq!(tokens[3].kind, TokenKind::Whitespace);
        assert_eq!(tokens[3].span, Span::new(4, 6));
        assert_eq!(tokens[4].kind, TokenKind::Text);
        assert_eq!(tokens[4].span, Span::new(6, 9));
        assert_eq!(tokens[5].kind, TokenKind::Newline);
        assert_eq!(scanner.next_token(LexMode::Body).kind, TokenKind::Dedent);
    }

    #[test]
    fn dedent_mismatch() {
        let mut scanner = Scanner::new("    x\n  y\n");
        assert_eq!(scanner.next_token(LexMode::BodyStart).kind, TokenKind::Indent);
        for _ in 0..3 {
            scanner.next_token(LexMode::Body);
        }
        let dedent = scanner.next_token(LexMode::Body);
        assert_eq!(dedent.kind, TokenKind::Dedent);
        let error = scanner.next_token(LexMode::Normal);
        assert_eq!(
            error.kind,
            TokenKind::ErrorRecovery(LexErrorKind::DedentMismatch {
                body: 4,
                enclosing: 0,
                found: 2
            })
        );
        assert_eq!(error.span, Span::new(6, 9));
    }

    #[test]
    fn dedent_at_end_of_input() {
        let mut scanner = Scanner::new("  x");
        assert_eq!(scanner.next_token(LexMode::BodyStart).kind, TokenKind::Indent);
        let kinds: Vec<_> = (0..4)
            .map(|_| scanner.next_token(LexMode::Body).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Whitespace,
                TokenKind::Text,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_prefixes() {
        for (line, len) in [("@-x", 2), ("-@x", 2), ("@x", 1), ("-x", 1)] {
            let input = format!("  {line}");
            let mut scanner = Scanner::new(&input);
            scanner.next_token(LexMode::BodyStart);
            scanner.next_token(LexMode::Body);
            let prefix = scanner.next_token(LexMode::Body);
            assert_eq!(prefix.kind, TokenKind::LinePrefix, "{line}");
            assert_eq!(prefix.span.len(), len, "{line}");
        }
    }

    #[test]
    fn body_interpolation() {
        let mut scanner = Scanner::new("  echo {{x}}");
        scanner.next_token(LexMode::BodyStart);
        let kinds: Vec<_> = (0..3)
            .map(|_| scanner.next_token(LexMode::Body).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Whitespace,
                TokenKind::Text,
                TokenKind::InterpolationStart,
            ]
        );
    }

    #[test]
    fn body_continuation_joins_lines() {
        let mut scanner = Scanner::new("  echo a \\\n    b\n");
        scanner.next_token(LexMode::BodyStart);
        scanner.next_token(LexMode::Body);
        let text = scanner.next_token(LexMode::Body);
        assert_eq!(text.kind, TokenKind::Text);
        assert_eq!(text.span, Span::new(2, 16));
    }

    #[test]
    fn escaped_backslash_does_not_continue() {
        let mut scanner = Scanner::new("  echo \\\\\n  b\n");
        scanner.next_token(LexMode::BodyStart);
        scanner.next_token(LexMode::Body);
        let text = scanner.next_token(LexMode::Body);
        assert_eq!(text.span, Span::new(2, 9));
        assert_eq!(scanner.next_token(LexMode::Body).kind, TokenKind::Newline);
    }

    #[test]
    fn shebang_with_env_and_flags() {
        let input = "#!/usr/bin/env -S python3 -u\n";
        let tokens = scan(input, LexMode::Normal);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::ShebangStart,
                TokenKind::ShebangPath,
                TokenKind::Keyword(Keyword::Env),
                TokenKind::Whitespace,
                TokenKind::ShebangFlag,
                TokenKind::Whitespace,
                TokenKind::Language,
                TokenKind::ShebangRest,
                TokenKind::Newline,
            ]
        );
        assert_eq!(tokens[6].text(input), "python3");
        assert_eq!(tokens[7].text(input), " -u");
    }

    #[test]
    fn shebang_direct_interpreter() {
        let input = "#!/bin/bash";
        let tokens = scan(input, LexMode::Normal);
        assert_eq!(tokens[1].text(input), "/bin/");
        assert_eq!(tokens[2].kind, TokenKind::Language);
        assert_eq!(tokens[2].text(input), "bash");
    }

    #[test]
    fn shebang_without_path_is_opaque() {
        let input = "#!python";
        let kinds = kinds(input, LexMode::Normal);
        assert_eq!(kinds, vec![TokenKind::ShebangStart, TokenKind::ShebangRest]);
    }

    #[test]
    fn shebang_only_on_first_line() {
        let kinds = kinds("a\n#!/bin/sh", LexMode::Normal);
        assert_eq!(kinds[2], TokenKind::Comment);
    }

    #[test]
    fn snapshot_and_restore() {
        let mut scanner = Scanner::new("a b");
        let before = scanner.snapshot();
        let first = scanner.next_token(LexMode::Normal);
        scanner.next_token(LexMode::Normal);
        scanner.restore(before);
        assert_eq!(scanner.next_token(LexMode::Normal), first);
    }

    #[test]
    fn tokens_cover_input() {
        let input = "x := \"a\" # c\nbuild:\n  @echo {{x}}\n";
        let tokens = tokenize(input);
        let mut offset = 0;
        for token in &tokens {
            assert_eq!(token.span.start, offset, "{token:?}");
            offset = token.span.end;
        }
        assert_eq!(offset, input.len());
    }
}

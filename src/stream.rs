//! Lookahead over the scanner.
//!
//! Tokens are scanned lazily in the current mode. Each buffered token
//! remembers the scanner state it was scanned from; switching modes
//! rewinds to the first unconsumed token and rescans it.

use std::collections::VecDeque;

use crate::lexer::{LexMode, Scanner, ScannerState};
use crate::token::{Span, Token, TokenKind};

#[derive(Debug)]
struct Buffered {
    token: Token,
    before: ScannerState,
}

#[derive(Debug)]
pub struct TokenStream<'a> {
    scanner: Scanner<'a>,
    mode: LexMode,
    buffer: VecDeque<Buffered>,
    nesting: usize,
    line_bound: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            mode: LexMode::Normal,
            buffer: VecDeque::new(),
            nesting: 0,
            line_bound: false,
        }
    }

    pub const fn mode(&self) -> LexMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LexMode) {
        if mode == self.mode {
            return;
        }
        if let Some(front) = self.buffer.pop_front() {
            log::trace!("rescanning from {} in {mode:?}", front.token.span.start);
            self.scanner.restore(front.before);
            self.buffer.clear();
        }
        self.mode = mode;
    }

    /// Depth of open `(`, `[` and `{`; newlines are trivia while it is
    /// non-zero.
    #[cfg(test)]
    pub const fn nesting(&self) -> usize {
        self.nesting
    }

    pub const fn open_delimiter(&mut self) {
        self.nesting += 1;
    }

    pub const fn close_delimiter(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    /// Make newlines significant regardless of nesting until
    /// [`TokenStream::leave_line_bound`] restores the returned state.
    pub const fn enter_line_bound(&mut self) -> (usize, bool) {
        let saved = (self.nesting, self.line_bound);
        self.nesting = 0;
        self.line_bound = true;
        saved
    }

    pub const fn leave_line_bound(&mut self, saved: (usize, bool)) {
        self.nesting = saved.0;
        self.line_bound = saved.1;
    }

    fn is_trivia(&self, kind: TokenKind) -> bool {
        kind.is_trivia() || (kind == TokenKind::Newline && self.nesting > 0 && !self.line_bound)
    }

    fn fill(&mut self, len: usize) -> bool {
        while self.buffer.len() < len {
            if self
                .buffer
                .back()
                .is_some_and(|b| b.token.kind == TokenKind::Eof)
            {
                return false;
            }
            let before = self.scanner.snapshot();
            let token = self.scanner.next_token(self.mode);
            self.buffer.push_back(Buffered { token, before });
        }
        true
    }

    /// Index into the buffer of the `n`th significant token.
    fn significant_index(&mut self, n: usize) -> usize {
        let mut seen = 0;
        let mut index = 0;
        loop {
            if !self.fill(index + 1) {
                return self.buffer.len() - 1;
            }
            let kind = self.buffer[index].token.kind;
            if kind == TokenKind::Eof || !self.is_trivia(kind) {
                if seen == n || kind == TokenKind::Eof {
                    return index;
                }
                seen += 1;
            }
            index += 1;
        }
    }

    /// The `n`th significant token ahead, skipping trivia.
    pub fn nth(&mut self, n: usize) -> Token {
        let index = self.significant_index(n);
        self.buffer[index].token
    }

    /// Consume leading trivia and the next significant token. At end
    /// of input the `Eof` token stays buffered.
    pub fn bump(&mut self) -> (Vec<Token>, Token) {
        let index = self.significant_index(0);
        let trivia: Vec<Token> = self.buffer.drain(..index).map(|b| b.token).collect();
        let token = self.buffer[0].token;
        if token.kind != TokenKind::Eof {
            self.buffer.pop_front();
        }
        (trivia, token)
    }

    /// Whether the next significant token is `first` and is immediately
    /// followed, without trivia, by `second`.
    pub fn at_glued(&mut self, first: TokenKind, second: TokenKind) -> bool {
        let index = self.significant_index(0);
        if self.buffer[index].token.kind != first || !self.fill(index + 2) {
            return false;
        }
        let (a, b) = (self.buffer[index].token, self.buffer[index + 1].token);
        b.kind == second && a.span.end == b.span.start
    }

    /// Consume two glued tokens as one token of `kind`.
    pub fn bump_glued(&mut self, kind: TokenKind) -> (Vec<Token>, Token) {
        let (trivia, first) = self.bump();
        let (_, second) = self.bump();
        (trivia, Token::new(kind, Span::new(first.span.start, second.span.end)))
    }

    /// Consume trivia up to the next significant token.
    pub fn take_trivia(&mut self) -> Vec<Token> {
        let index = self.significant_index(0);
        self.buffer.drain(..index).map(|b| b.token).collect()
    }
}

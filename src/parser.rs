use std::fmt;

use crate::builder::{Checkpoint, TreeBuilder};
use crate::cst::{Field, NodeKind, Tree};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::document::LineIndex;
use crate::lexer::LexMode;
use crate::stream::TokenStream;
use crate::token::{Keyword, Span, Token, TokenKind};

/// Default limit on expression nesting.
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Found a token that cannot continue the current construct.
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    /// A required token is absent; a zero-width `MISSING` node marks it.
    MissingToken { expected: &'static str },
    /// Bare numbers are lexed but are never valid values.
    NumericLiteralAsValue,
    /// A parameter follows a variadic parameter.
    MisplacedVariadic,
    /// Expression nesting exceeded the configured limit.
    NestingTooDeep { limit: usize },
}

impl ParseErrorKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::MissingToken { .. } => "missing_token",
            Self::NumericLiteralAsValue => "numeric_literal_as_value",
            Self::MisplacedVariadic => "misplaced_variadic",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::MissingToken { expected } => {
                write!(f, "missing {expected}")
            }
            Self::NumericLiteralAsValue => {
                write!(f, "numbers are not values, quote it as a string")
            }
            Self::MisplacedVariadic => {
                write!(f, "variadic parameter must be the last parameter")
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "expression nesting exceeds the limit of {limit}")
            }
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Deepest expression nesting accepted before the rest of the
    /// construct collapses into an `ERROR` node.
    #[must_use]
    pub const fn max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    #[must_use]
    pub const fn nesting_limit(&self) -> usize {
        self.max_nesting
    }
}

/// Parse a justfile. Never fails: syntax errors become error nodes and
/// diagnostics in the returned tree.
#[must_use]
pub fn parse(input: &str) -> Tree {
    parse_with_options(input, ParseOptions::default())
}

#[must_use]
pub fn parse_with_options(input: &str, options: ParseOptions) -> Tree {
    parse_recording(input, options).0
}

/// Parse and also return every token consumed, in source order.
pub(crate) fn parse_recording(input: &str, options: ParseOptions) -> (Tree, Vec<Token>) {
    Parser::new(input, options).parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Alias,
    Assignment,
    Export,
    Unexport,
    Import,
    Module,
    Setting,
    Recipe,
}

struct Parser<'a> {
    source: &'a str,
    tokens: TokenStream<'a>,
    builder: TreeBuilder,
    errors: Vec<(DiagnosticKind, Span)>,
    consumed: Vec<Token>,
    depth: usize,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, options: ParseOptions) -> Self {
        Self {
            source,
            tokens: TokenStream::new(source),
            builder: TreeBuilder::new(NodeKind::SourceFile),
            errors: Vec::new(),
            consumed: Vec::new(),
            depth: 0,
            options,
        }
    }

    fn parse(mut self) -> (Tree, Vec<Token>) {
        if self.at(TokenKind::ShebangStart) {
            self.shebang();
            self.line_end();
        }
        while !self.at(TokenKind::Eof) {
            self.item();
        }
        self.flush_trivia();
        let root = self.builder.finish();

        self.errors.sort_by_key(|(_, span)| span.start);
        let lines = LineIndex::new(self.source);
        let mut cursor = lines.cursor(self.source);
        let diagnostics: Vec<Diagnostic> = self
            .errors
            .into_iter()
            .map(|(kind, span)| Diagnostic {
                kind,
                span,
                position: cursor.position(span.start),
            })
            .collect();

        log::debug!(
            "parsed {} bytes into {} nodes with {} diagnostics",
            self.source.len(),
            root.count(),
            diagnostics.len()
        );
        (
            Tree::new(self.source.to_string(), root, diagnostics),
            self.consumed,
        )
    }

    // -- token helpers --

    fn nth(&mut self, n: usize) -> TokenKind {
        self.tokens.nth(n).kind
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.nth(0) == kind
    }

    fn nth_text(&mut self, n: usize) -> &'a str {
        self.tokens.nth(n).span.text(self.source)
    }

    fn nth_is_keyword(&mut self, n: usize, keyword: Keyword) -> bool {
        self.nth(n) == TokenKind::Identifier && self.nth_text(n) == keyword.as_str()
    }

    fn at_keyword(&mut self, keyword: Keyword) -> bool {
        self.nth_is_keyword(0, keyword)
    }

    fn at_line_end(&mut self) -> bool {
        matches!(
            self.nth(0),
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        )
    }

    fn bump(&mut self) {
        self.bump_as(None);
    }

    /// Hand pending trivia to the builder so it lands before, not
    /// inside, the node about to open.
    fn flush_trivia(&mut self) {
        let trivia = self.tokens.take_trivia();
        self.consumed.extend(trivia.iter().copied());
        self.builder.trivia(trivia);
    }

    fn start_node(&mut self, kind: NodeKind) {
        self.flush_trivia();
        self.builder.start_node(kind);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn bump_keyword(&mut self, keyword: Keyword) {
        self.bump_as(Some(TokenKind::Keyword(keyword)));
    }

    fn bump_field(&mut self, field: Field) {
        self.builder.field(field);
        self.bump();
    }

    fn bump_as(&mut self, retag: Option<TokenKind>) {
        if self.at(TokenKind::Eof) {
            return;
        }
        let (trivia, mut token) = self.tokens.bump();
        if let Some(kind) = retag {
            token.kind = kind;
        }
        self.push_token(trivia, token);
    }

    fn push_token(&mut self, trivia: Vec<Token>, token: Token) {
        self.consumed.extend(trivia.iter().copied());
        self.builder.trivia(trivia);
        if let TokenKind::ErrorRecovery(kind) = token.kind {
            log::trace!("lexical error {kind} at {}", token.span);
            self.report(DiagnosticKind::Lex(kind), token.span);
        }
        self.consumed.push(token);
        self.builder.token(NodeKind::from_token(token.kind), token.span);
    }

    fn bump_open(&mut self) {
        self.bump();
        self.tokens.open_delimiter();
    }

    fn close(&mut self, kind: TokenKind, expected: &'static str) {
        if self.at(kind) {
            self.bump();
        } else {
            self.missing(expected);
        }
        self.tokens.close_delimiter();
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.missing(expected);
            false
        }
    }

    fn expect_identifier(&mut self, field: Field, expected: &'static str) {
        self.builder.field(field);
        if self.at(TokenKind::Identifier) {
            self.bump();
        } else {
            self.missing(expected);
        }
    }

    // -- error helpers --

    fn report(&mut self, kind: DiagnosticKind, span: Span) {
        self.errors.push((kind, span));
    }

    fn describe(&mut self) -> String {
        let token = self.tokens.nth(0);
        match token.kind {
            TokenKind::Identifier => format!("identifier `{}`", token.text(self.source)),
            kind => kind.to_string(),
        }
    }

    fn missing(&mut self, expected: &'static str) {
        let span = self.builder.empty(NodeKind::Missing);
        log::trace!("missing {expected} at {span}");
        self.report(
            DiagnosticKind::Parse(ParseErrorKind::MissingToken { expected }),
            span,
        );
    }

    /// Consume one token, parsing strings and backticks whole so their
    /// contents are scanned in the right mode.
    fn bump_any(&mut self) {
        match self.nth(0) {
            TokenKind::StringStart(_) => self.string(),
            TokenKind::CommandStart { .. } => self.external_command(),
            _ => self.bump(),
        }
    }

    /// Wrap the next token in an `ERROR` node.
    fn error_token(&mut self, expected: &'static str) {
        if matches!(self.nth(0), TokenKind::ErrorRecovery(_)) {
            self.bump();
            return;
        }
        let found = self.describe();
        self.start_node(NodeKind::Error);
        self.bump_any();
        let span = self.builder.finish_node();
        log::trace!("unexpected {found} at {span}, expected {expected}");
        self.report(
            DiagnosticKind::Parse(ParseErrorKind::UnexpectedToken { expected, found }),
            span,
        );
    }

    /// Wrap everything up to the end of the line in an `ERROR` node.
    fn recover_line(&mut self, expected: &'static str) {
        if self.at_line_end() {
            self.missing(expected);
            return;
        }
        let found = self.describe();
        self.start_node(NodeKind::Error);
        while !self.at_line_end() {
            self.bump_any();
        }
        let span = self.builder.finish_node();
        log::trace!("skipped {span} looking for {expected}");
        self.report(
            DiagnosticKind::Parse(ParseErrorKind::UnexpectedToken { expected, found }),
            span,
        );
    }

    fn line_end(&mut self) {
        match self.nth(0) {
            TokenKind::Newline => self.bump(),
            TokenKind::Eof | TokenKind::Dedent => {}
            _ => {
                self.recover_line("end of line");
                if self.at(TokenKind::Newline) {
                    self.bump();
                }
            }
        }
    }

    // -- items --

    fn item(&mut self) {
        match self.nth(0) {
            TokenKind::Newline
            | TokenKind::Indent
            | TokenKind::Dedent
            | TokenKind::ErrorRecovery(_) => {
                self.bump();
                return;
            }
            _ => {}
        }

        let checkpoint = self.checkpoint();
        let mut attributed = false;
        while self.at(TokenKind::BracketL) || (attributed && self.at(TokenKind::Newline)) {
            if self.at(TokenKind::Newline) {
                self.bump();
            } else {
                self.attribute();
            }
            attributed = true;
        }

        match self.item_kind() {
            Some(ItemKind::Alias) => self.alias(checkpoint),
            Some(ItemKind::Assignment) => self.assignment(checkpoint),
            Some(ItemKind::Export) => self.export(checkpoint, NodeKind::Export, Keyword::Export),
            Some(ItemKind::Unexport) => {
                self.export(checkpoint, NodeKind::Unexport, Keyword::Unexport);
            }
            Some(ItemKind::Import) => self.import(checkpoint),
            Some(ItemKind::Module) => self.module(checkpoint),
            Some(ItemKind::Setting) => self.setting(checkpoint),
            Some(ItemKind::Recipe) => self.recipe(checkpoint),
            None if attributed => self.recover_line("item after attributes"),
            None => {
                self.recover_line("item");
                if self.at(TokenKind::Newline) {
                    self.bump();
                }
            }
        }
    }

    fn item_kind(&mut self) -> Option<ItemKind> {
        match self.nth(0) {
            TokenKind::At => return Some(ItemKind::Recipe),
            TokenKind::Identifier => {}
            _ => return None,
        }
        let second = self.nth(1);
        let kind = match self.nth_text(0) {
            "alias" if second == TokenKind::Identifier => ItemKind::Alias,
            "export" if second == TokenKind::Identifier && self.nth(2) == TokenKind::ColonEquals => {
                ItemKind::Export
            }
            "unexport"
                if second == TokenKind::Identifier && self.nth(2) == TokenKind::ColonEquals =>
            {
                ItemKind::Unexport
            }
            "import" if matches!(second, TokenKind::StringStart(_) | TokenKind::Question) => {
                ItemKind::Import
            }
            "mod" if matches!(second, TokenKind::Identifier | TokenKind::Question) => {
                ItemKind::Module
            }
            "set" if second == TokenKind::Identifier => ItemKind::Setting,
            _ if second == TokenKind::ColonEquals => ItemKind::Assignment,
            _ => ItemKind::Recipe,
        };
        Some(kind)
    }

    fn assignment(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, NodeKind::Assignment, None);
        self.expect_identifier(Field::Left, "variable name");
        self.expect(TokenKind::ColonEquals, "':='");
        self.builder.field(Field::Right);
        self.expression();
        self.line_end();
        self.builder.finish_node();
    }

    fn export(&mut self, checkpoint: Checkpoint, kind: NodeKind, keyword: Keyword) {
        self.builder.start_node_at(checkpoint, kind, None);
        self.bump_keyword(keyword);
        let inner = self.checkpoint();
        self.assignment(inner);
        self.builder.finish_node();
    }

    fn alias(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, NodeKind::Alias, None);
        self.bump_keyword(Keyword::Alias);
        self.expect_identifier(Field::Left, "alias name");
        self.expect(TokenKind::ColonEquals, "':='");
        self.builder.field(Field::Right);
        if self.at(TokenKind::Identifier) {
            self.name_or_module_path();
        } else {
            self.missing("alias target");
        }
        self.line_end();
        self.builder.finish_node();
    }

    fn import(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, NodeKind::Import, None);
        self.bump_keyword(Keyword::Import);
        if self.at(TokenKind::Question) {
            self.bump();
        }
        if matches!(self.nth(0), TokenKind::StringStart(_)) {
            self.string();
        } else {
            self.missing("import path");
        }
        self.line_end();
        self.builder.finish_node();
    }

    fn module(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, NodeKind::Module, None);
        self.bump_keyword(Keyword::Mod);
        if self.at(TokenKind::Question) {
            self.bump();
        }
        self.expect_identifier(Field::Name, "module name");
        if matches!(self.nth(0), TokenKind::StringStart(_)) {
            self.string();
        }
        self.line_end();
        self.builder.finish_node();
    }

    fn setting(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, NodeKind::Setting, None);
        self.bump_keyword(Keyword::Set);
        let name = self.nth_text(0);
        let wants_array = matches!(name, "shell" | "windows-shell" | "script-interpreter");
        self.bump_field(Field::Left);

        if self.at(TokenKind::ColonEquals) {
            self.bump();
            match self.nth(0) {
                TokenKind::BracketL => {
                    self.builder.field(Field::Right);
                    self.array();
                }
                _ if wants_array => self.recover_line("array"),
                TokenKind::StringStart(_) => {
                    self.builder.field(Field::Right);
                    self.string();
                }
                TokenKind::Identifier
                    if self.at_keyword(Keyword::True) || self.at_keyword(Keyword::False) =>
                {
                    self.builder.field(Field::Right);
                    self.boolean();
                }
                _ => self.recover_line("boolean, string or array"),
            }
        }
        self.line_end();
        self.builder.finish_node();
    }

    fn boolean(&mut self) {
        self.start_node(NodeKind::Boolean);
        if self.at_keyword(Keyword::True) {
            self.bump_keyword(Keyword::True);
        } else {
            self.bump_keyword(Keyword::False);
        }
        self.builder.finish_node();
    }

    fn array(&mut self) {
        self.start_node(NodeKind::Array);
        self.bump_open();
        loop {
            match self.nth(0) {
                TokenKind::BracketR | TokenKind::Eof => break,
                TokenKind::StringStart(_) => {
                    self.builder.field(Field::Element);
                    self.string();
                }
                _ => self.error_token("string"),
            }
            if self.at(TokenKind::Comma) {
                self.bump();
            } else if !matches!(self.nth(0), TokenKind::StringStart(_)) {
                break;
            }
        }
        self.close(TokenKind::BracketR, "']'");
        self.builder.finish_node();
    }

    fn attribute(&mut self) {
        self.start_node(NodeKind::Attribute);
        self.bump_open();
        loop {
            if self.at(TokenKind::Identifier) {
                self.attribute_entry();
            } else if self.at(TokenKind::BracketR) || self.at(TokenKind::Eof) {
                self.missing("attribute name");
                break;
            } else {
                self.error_token("attribute name");
            }
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.bump();
        }
        self.close(TokenKind::BracketR, "']'");
        if self.at(TokenKind::Newline) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn attribute_entry(&mut self) {
        match self.nth(1) {
            TokenKind::ParenL => {
                self.start_node(NodeKind::AttributeCall);
                self.bump_field(Field::Name);
                self.bump_open();
                while !matches!(self.nth(0), TokenKind::ParenR | TokenKind::Eof) {
                    match self.nth(0) {
                        TokenKind::StringStart(_) => {
                            self.builder.field(Field::Argument);
                            self.string();
                        }
                        TokenKind::Identifier => {
                            self.builder.field(Field::Argument);
                            self.attribute_named_param();
                        }
                        _ => self.error_token("attribute argument"),
                    }
                    if !self.at(TokenKind::Comma) {
                        break;
                    }
                    self.bump();
                }
                self.close(TokenKind::ParenR, "')'");
            }
            TokenKind::Colon => {
                self.start_node(NodeKind::AttributeKeyValue);
                self.bump_field(Field::Name);
                self.bump();
                self.builder.field(Field::Argument);
                if matches!(self.nth(0), TokenKind::StringStart(_)) {
                    self.string();
                } else {
                    self.missing("string");
                }
            }
            _ => {
                self.start_node(NodeKind::AttributeFlag);
                self.bump_field(Field::Name);
            }
        }
        self.builder.finish_node();
    }

    fn attribute_named_param(&mut self) {
        self.start_node(NodeKind::AttributeNamedParam);
        self.bump_field(Field::Name);
        if self.at(TokenKind::Equals) {
            self.bump();
            self.builder.field(Field::Value);
            if matches!(self.nth(0), TokenKind::StringStart(_)) {
                self.string();
            } else {
                self.missing("string");
            }
        }
        self.builder.finish_node();
    }

    /// `a::b::c` as a `module_path`, a lone name as an identifier.
    fn name_or_module_path(&mut self) {
        if self.nth(1) != TokenKind::DoubleColon {
            self.bump();
            return;
        }
        self.start_node(NodeKind::ModulePath);
        self.bump();
        while self.at(TokenKind::DoubleColon) {
            self.bump();
            if self.at(TokenKind::Identifier) {
                self.bump();
            } else {
                self.missing("module name");
                break;
            }
        }
        self.builder.finish_node();
    }

    // -- recipes --

    fn recipe(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, NodeKind::Recipe, None);
        self.recipe_header();
        self.line_end();

        self.tokens.set_mode(LexMode::BodyStart);
        if self.at(TokenKind::Indent) {
            self.builder.field(Field::Body);
            self.recipe_body();
        }
        self.tokens.set_mode(LexMode::Normal);
        self.builder.finish_node();
    }

    fn recipe_header(&mut self) {
        self.start_node(NodeKind::RecipeHeader);
        if self.at(TokenKind::At) {
            self.bump();
        }
        self.expect_identifier(Field::Name, "recipe name");
        if matches!(
            self.nth(0),
            TokenKind::Identifier | TokenKind::Dollar | TokenKind::Star | TokenKind::Plus
        ) {
            self.parameters();
        }
        if self.expect(TokenKind::Colon, "':'")
            && matches!(
                self.nth(0),
                TokenKind::Identifier | TokenKind::ParenL | TokenKind::AmpAmp
            )
        {
            self.dependencies();
        }
        self.builder.finish_node();
    }

    fn parameters(&mut self) {
        self.start_node(NodeKind::Parameters);
        let mut variadic = false;
        loop {
            let is_variadic = match self.nth(0) {
                TokenKind::Identifier | TokenKind::Dollar => false,
                TokenKind::Star | TokenKind::Plus => true,
                _ => break,
            };
            if variadic {
                let checkpoint = self.checkpoint();
                self.parameter_or_variadic(is_variadic);
                self.builder
                    .start_node_at(checkpoint, NodeKind::Error, None);
                let span = self.builder.finish_node();
                log::trace!("parameter after variadic at {span}");
                self.report(
                    DiagnosticKind::Parse(ParseErrorKind::MisplacedVariadic),
                    span,
                );
            } else {
                self.parameter_or_variadic(is_variadic);
            }
            variadic |= is_variadic;
        }
        self.builder.finish_node();
    }

    fn parameter_or_variadic(&mut self, variadic: bool) {
        if variadic {
            self.start_node(NodeKind::VariadicParameter);
            self.bump_field(Field::Kleene);
            self.parameter();
            self.builder.finish_node();
        } else {
            self.parameter();
        }
    }

    fn parameter(&mut self) {
        self.start_node(NodeKind::Parameter);
        if self.at(TokenKind::Dollar) {
            self.bump();
        }
        self.expect_identifier(Field::Name, "parameter name");
        if self.at(TokenKind::Equals) {
            self.bump();
            self.builder.field(Field::Default);
            self.value();
        }
        self.builder.finish_node();
    }

    fn dependencies(&mut self) {
        self.start_node(NodeKind::Dependencies);
        loop {
            let after_and = self.at(TokenKind::AmpAmp);
            if after_and {
                self.bump();
            }
            match self.nth(0) {
                TokenKind::Identifier | TokenKind::ParenL => self.dependency(),
                _ => {
                    if after_and {
                        self.missing("dependency");
                    }
                    break;
                }
            }
        }
        self.builder.finish_node();
    }

    fn dependency(&mut self) {
        self.start_node(NodeKind::Dependency);
        if self.at(TokenKind::ParenL) {
            self.dependency_expression();
        } else {
            self.builder.field(Field::Name);
            self.name_or_module_path();
        }
        self.builder.finish_node();
    }

    fn dependency_expression(&mut self) {
        self.start_node(NodeKind::DependencyExpression);
        self.bump_open();
        self.builder.field(Field::Name);
        if self.at(TokenKind::Identifier) {
            self.name_or_module_path();
        } else {
            self.missing("dependency name");
        }
        while starts_expression(self.nth(0)) {
            self.expression();
        }
        self.close(TokenKind::ParenR, "')'");
        self.builder.finish_node();
    }

    fn recipe_body(&mut self) {
        self.start_node(NodeKind::RecipeBody);
        self.bump();
        self.tokens.set_mode(LexMode::Body);
        if self.at(TokenKind::ShebangStart) {
            self.builder.field(Field::Shebang);
            self.shebang();
            if self.at(TokenKind::Newline) {
                self.bump();
            }
        }
        loop {
            match self.nth(0) {
                TokenKind::Dedent => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => self.bump(),
                _ => {
                    self.recipe_line();
                    if self.at(TokenKind::Newline) {
                        self.bump();
                    }
                }
            }
        }
        self.builder.finish_node();
    }

    fn recipe_line(&mut self) {
        self.start_node(NodeKind::RecipeLine);
        if self.at(TokenKind::LinePrefix) {
            self.bump();
        }
        loop {
            match self.nth(0) {
                TokenKind::Text => self.bump(),
                TokenKind::InterpolationStart => self.interpolation(),
                TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof => break,
                _ => self.error_token("recipe line"),
            }
        }
        self.builder.finish_node();
    }

    fn shebang(&mut self) {
        self.start_node(NodeKind::Shebang);
        self.bump();
        while matches!(
            self.nth(0),
            TokenKind::ShebangPath
                | TokenKind::ShebangFlag
                | TokenKind::Language
                | TokenKind::ShebangRest
                | TokenKind::Keyword(Keyword::Env)
        ) {
            self.bump();
        }
        self.builder.finish_node();
    }

    // -- expressions --

    fn expression(&mut self) {
        if self.depth >= self.options.max_nesting {
            self.too_deep();
            return;
        }
        self.depth += 1;
        self.start_node(NodeKind::Expression);
        if self.at(TokenKind::Slash) {
            self.bump();
        }
        self.binary(1);
        self.builder.finish_node();
        self.depth -= 1;
    }

    /// Precedence climbing: `/` binds tighter than `+`, both associate
    /// to the left. Each operator nests the operands before it one level
    /// deeper, so chain length counts against the nesting limit.
    fn binary(&mut self, min_precedence: u8) {
        let checkpoint = self.checkpoint();
        self.operand();
        let mut wrapped = 0;
        loop {
            let precedence = match self.nth(0) {
                TokenKind::Plus => 1,
                TokenKind::Slash => 2,
                _ => break,
            };
            if precedence < min_precedence {
                break;
            }
            if self.depth >= self.options.max_nesting {
                self.too_deep();
                break;
            }
            self.builder
                .start_node_at(checkpoint, NodeKind::Expression, Some(Field::Left));
            self.builder.finish_node();
            self.depth += 1;
            wrapped += 1;
            self.bump();
            self.builder.field(Field::Right);
            self.start_node(NodeKind::Expression);
            self.binary(precedence + 1);
            self.builder.finish_node();
        }
        self.depth -= wrapped;
    }

    fn operand(&mut self) {
        if self.at_keyword(Keyword::If) {
            self.if_expression();
        } else {
            self.value();
        }
    }

    fn too_deep(&mut self) {
        let limit = self.options.max_nesting;
        self.start_node(NodeKind::Error);
        let mut balance = 0_usize;
        loop {
            match self.nth(0) {
                TokenKind::Eof | TokenKind::Newline | TokenKind::Dedent => break,
                TokenKind::ParenL | TokenKind::BracketL | TokenKind::BraceL => {
                    balance += 1;
                    self.bump();
                }
                TokenKind::ParenR | TokenKind::BracketR | TokenKind::BraceR => {
                    if balance == 0 {
                        break;
                    }
                    balance -= 1;
                    self.bump();
                }
                _ => self.bump_any(),
            }
        }
        let span = self.builder.finish_node();
        log::trace!("nesting limit {limit} reached at {span}");
        self.report(
            DiagnosticKind::Parse(ParseErrorKind::NestingTooDeep { limit }),
            span,
        );
    }

    fn value(&mut self) {
        match self.nth(0) {
            TokenKind::Identifier if self.nth(1) == TokenKind::ParenL => {
                self.start_node(NodeKind::Value);
                self.function_call();
                self.builder.finish_node();
            }
            TokenKind::Identifier => {
                self.start_node(NodeKind::Value);
                self.bump();
                self.builder.finish_node();
            }
            TokenKind::StringStart(_) => {
                self.start_node(NodeKind::Value);
                self.string();
                self.builder.finish_node();
            }
            TokenKind::CommandStart { .. } => {
                self.start_node(NodeKind::Value);
                self.external_command();
                self.builder.finish_node();
            }
            TokenKind::Number => {
                self.start_node(NodeKind::Value);
                let span = self.tokens.nth(0).span;
                self.bump();
                self.report(
                    DiagnosticKind::Parse(ParseErrorKind::NumericLiteralAsValue),
                    span,
                );
                self.builder.finish_node();
            }
            TokenKind::ParenL => {
                self.start_node(NodeKind::Value);
                self.bump_open();
                self.expression();
                self.close(TokenKind::ParenR, "')'");
                self.builder.finish_node();
            }
            TokenKind::ErrorRecovery(_) => self.bump(),
            kind if kind.ends_value() => self.missing("expression"),
            _ => self.error_token("expression"),
        }
    }

    fn function_call(&mut self) {
        self.start_node(NodeKind::FunctionCall);
        self.bump_field(Field::Name);
        self.bump_open();
        if starts_expression(self.nth(0)) {
            self.builder.field(Field::Arguments);
            self.sequence();
        }
        self.close(TokenKind::ParenR, "')'");
        self.builder.finish_node();
    }

    fn sequence(&mut self) {
        self.start_node(NodeKind::Sequence);
        self.expression();
        while self.at(TokenKind::Comma) {
            self.bump();
            if self.at(TokenKind::ParenR) {
                break;
            }
            self.expression();
        }
        self.builder.finish_node();
    }

    fn if_expression(&mut self) {
        self.start_node(NodeKind::IfExpression);
        self.bump_keyword(Keyword::If);
        self.condition();
        self.braced(Field::Consequence);
        while self.at_keyword(Keyword::Else) {
            self.builder.field(Field::Alternative);
            if self.nth_is_keyword(1, Keyword::If) {
                self.start_node(NodeKind::ElseIfClause);
                self.bump_keyword(Keyword::Else);
                self.bump_keyword(Keyword::If);
                self.condition();
                self.braced(Field::Body);
                self.builder.finish_node();
            } else {
                self.start_node(NodeKind::ElseClause);
                self.bump_keyword(Keyword::Else);
                self.braced(Field::Body);
                self.builder.finish_node();
                break;
            }
        }
        self.builder.finish_node();
    }

    fn braced(&mut self, field: Field) {
        let opened = self.at(TokenKind::BraceL);
        if opened {
            self.bump_open();
        } else {
            self.missing("'{'");
        }
        self.builder.field(field);
        self.expression();
        if opened {
            self.close(TokenKind::BraceR, "'}'");
        }
    }

    fn condition(&mut self) {
        self.start_node(NodeKind::Condition);
        self.builder.field(Field::Left);
        self.expression();
        match self.nth(0) {
            TokenKind::EqualsEquals | TokenKind::BangEquals => {
                self.bump();
                self.builder.field(Field::Right);
                self.expression();
            }
            TokenKind::EqualsTilde => {
                self.bump();
                self.builder.field(Field::Right);
                if matches!(self.nth(0), TokenKind::StringStart(_)) {
                    self.start_node(NodeKind::RegexLiteral);
                    self.string();
                    self.builder.finish_node();
                } else {
                    self.expression();
                }
            }
            _ => {}
        }
        self.builder.finish_node();
    }

    // -- literals --

    fn string(&mut self) {
        let TokenKind::StringStart(kind) = self.nth(0) else {
            self.missing("string");
            return;
        };
        let previous = self.tokens.mode();
        self.start_node(NodeKind::String);
        if kind.is_format() {
            self.start_node(NodeKind::FormatString);
        }
        self.bump();
        self.tokens.set_mode(LexMode::StringContent(kind));
        loop {
            match self.nth(0) {
                TokenKind::StringContent | TokenKind::EscapeSequence => self.bump(),
                TokenKind::InterpolationStart => self.interpolation(),
                TokenKind::StringEnd(_) | TokenKind::ErrorRecovery(_) => {
                    self.bump();
                    break;
                }
                _ => break,
            }
        }
        self.tokens.set_mode(previous);
        if kind.is_format() {
            self.builder.finish_node();
        }
        self.builder.finish_node();
    }

    fn external_command(&mut self) {
        let TokenKind::CommandStart { indented } = self.nth(0) else {
            self.missing("backtick");
            return;
        };
        let previous = self.tokens.mode();
        self.start_node(NodeKind::ExternalCommand);
        self.bump();
        self.tokens
            .set_mode(LexMode::CommandContent { indented });
        if matches!(
            self.nth(0),
            TokenKind::CommandContent | TokenKind::InterpolationStart
        ) {
            self.start_node(NodeKind::CommandBody);
            loop {
                match self.nth(0) {
                    TokenKind::CommandContent => self.bump(),
                    TokenKind::InterpolationStart => self.interpolation(),
                    _ => break,
                }
            }
            self.builder.finish_node();
        }
        if matches!(
            self.nth(0),
            TokenKind::CommandEnd { .. } | TokenKind::ErrorRecovery(_)
        ) {
            self.bump();
        }
        self.tokens.set_mode(previous);
        self.builder.finish_node();
    }

    /// `{{ expression }}` inside a body line, format string or backtick.
    /// The expression is confined to the current line.
    fn interpolation(&mut self) {
        let previous = self.tokens.mode();
        self.start_node(NodeKind::Interpolation);
        self.bump();
        self.tokens.set_mode(LexMode::Normal);
        let saved = self.tokens.enter_line_bound();
        self.expression();
        if self.tokens.at_glued(TokenKind::BraceR, TokenKind::BraceR) {
            let (trivia, token) = self.tokens.bump_glued(TokenKind::InterpolationEnd);
            self.push_token(trivia, token);
        } else {
            self.missing("'}}'");
        }
        self.tokens.leave_line_bound(saved);
        self.tokens.set_mode(previous);
        self.builder.finish_node();
    }
}

const fn starts_expression(kind: TokenKind) -> bool {
    kind.starts_value() || matches!(kind, TokenKind::Slash)
}

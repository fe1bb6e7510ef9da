//! Concrete syntax tree.
//!
//! A [`Tree`] owns the source text, the root [`Node`] and the
//! diagnostics collected while parsing. Every byte of the source is
//! covered by exactly one leaf; concatenating the leaves in document
//! order reproduces the input.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::diagnostic::Diagnostic;
use crate::document::LineIndex;
use crate::token::{Position, Span, TokenKind};

/// Kind of a CST node. Named kinds carry grammar meaning; anonymous
/// leaves are wrapped token kinds named by their literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    Shebang,
    Language,
    Alias,
    Assignment,
    Export,
    Unexport,
    Import,
    Module,
    ModulePath,
    Setting,
    Boolean,
    Array,
    Recipe,
    RecipeHeader,
    Parameters,
    Parameter,
    VariadicParameter,
    Dependencies,
    Dependency,
    DependencyExpression,
    RecipeBody,
    RecipeLine,
    RecipeLinePrefix,
    Text,
    Attribute,
    AttributeFlag,
    AttributeCall,
    AttributeKeyValue,
    AttributeNamedParam,
    Expression,
    IfExpression,
    ElseIfClause,
    ElseClause,
    Condition,
    RegexLiteral,
    Value,
    FunctionCall,
    Sequence,
    ExternalCommand,
    CommandBody,
    String,
    FormatString,
    EscapeSequence,
    Interpolation,
    Identifier,
    Comment,
    NumericError,
    ErrorRecovery,
    Error,
    Missing,
    Token(TokenKind),
}

impl NodeKind {
    /// Stable name used by selectors, S-expressions and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceFile => "source_file",
            Self::Shebang => "shebang",
            Self::Language => "language",
            Self::Alias => "alias",
            Self::Assignment => "assignment",
            Self::Export => "export",
            Self::Unexport => "unexport",
            Self::Import => "import",
            Self::Module => "module",
            Self::ModulePath => "module_path",
            Self::Setting => "setting",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Recipe => "recipe",
            Self::RecipeHeader => "recipe_header",
            Self::Parameters => "parameters",
            Self::Parameter => "parameter",
            Self::VariadicParameter => "variadic_parameter",
            Self::Dependencies => "dependencies",
            Self::Dependency => "dependency",
            Self::DependencyExpression => "dependency_expression",
            Self::RecipeBody => "recipe_body",
            Self::RecipeLine => "recipe_line",
            Self::RecipeLinePrefix => "recipe_line_prefix",
            Self::Text => "text",
            Self::Attribute => "attribute",
            Self::AttributeFlag => "attribute_flag",
            Self::AttributeCall => "attribute_call",
            Self::AttributeKeyValue => "attribute_key_value",
            Self::AttributeNamedParam => "attribute_named_param",
            Self::Expression => "expression",
            Self::IfExpression => "if_expression",
            Self::ElseIfClause => "else_if_clause",
            Self::ElseClause => "else_clause",
            Self::Condition => "condition",
            Self::RegexLiteral => "regex_literal",
            Self::Value => "value",
            Self::FunctionCall => "function_call",
            Self::Sequence => "sequence",
            Self::ExternalCommand => "external_command",
            Self::CommandBody => "command_body",
            Self::String => "string",
            Self::FormatString => "format_string",
            Self::EscapeSequence => "escape_sequence",
            Self::Interpolation => "interpolation",
            Self::Identifier => "identifier",
            Self::Comment => "comment",
            Self::NumericError => "numeric_error",
            Self::ErrorRecovery => "error_recovery",
            Self::Error => "ERROR",
            Self::Missing => "MISSING",
            Self::Token(kind) => kind.as_str(),
        }
    }

    /// Leaf kind for a scanned token.
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Identifier => Self::Identifier,
            TokenKind::Comment => Self::Comment,
            TokenKind::Text => Self::Text,
            TokenKind::LinePrefix => Self::RecipeLinePrefix,
            TokenKind::EscapeSequence => Self::EscapeSequence,
            TokenKind::Language => Self::Language,
            TokenKind::Number => Self::NumericError,
            TokenKind::ErrorRecovery(_) => Self::ErrorRecovery,
            other => Self::Token(other),
        }
    }

    #[must_use]
    pub const fn is_named(self) -> bool {
        !matches!(self, Self::Token(_))
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Missing | Self::ErrorRecovery)
    }

    #[must_use]
    pub const fn is_trivia(self) -> bool {
        match self {
            Self::Comment => true,
            Self::Token(kind) => kind.is_trivia(),
            _ => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Role of a child within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Alternative,
    Argument,
    Arguments,
    Body,
    Consequence,
    Default,
    Element,
    Kleene,
    Left,
    Name,
    Right,
    Shebang,
    Value,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alternative => "alternative",
            Self::Argument => "argument",
            Self::Arguments => "arguments",
            Self::Body => "body",
            Self::Consequence => "consequence",
            Self::Default => "default",
            Self::Element => "element",
            Self::Kleene => "kleene",
            Self::Left => "left",
            Self::Name => "name",
            Self::Right => "right",
            Self::Shebang => "shebang",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the tree. Leaves have no children and span exactly the
/// text of their token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Child>,
}

/// A child slot: the node plus the field it fills, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Child {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub node: Node,
}

impl Node {
    #[must_use]
    pub const fn leaf(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// Branch node spanning its children; `fallback` positions an
    /// empty branch.
    #[must_use]
    pub fn branch(kind: NodeKind, children: Vec<Child>, fallback: usize) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(first.node.span.start, last.node.span.end),
            _ => Span::empty(fallback),
        };
        Self {
            kind,
            span,
            children,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether this node or any descendant is an error node.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.kind.is_error() || self.children.iter().any(|c| c.node.has_error())
    }

    #[must_use]
    pub fn child_by_field(&self, field: Field) -> Option<&Self> {
        self.children
            .iter()
            .find(|c| c.field == Some(field))
            .map(|c| &c.node)
    }

    pub fn children_by_field(&self, field: Field) -> impl Iterator<Item = &Self> {
        self.children
            .iter()
            .filter(move |c| c.field == Some(field))
            .map(|c| &c.node)
    }

    /// First direct child of `kind`.
    #[must_use]
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Self> {
        self.children
            .iter()
            .map(|c| &c.node)
            .find(|n| n.kind == kind)
    }

    pub fn named_children(&self) -> impl Iterator<Item = &Self> {
        self.children
            .iter()
            .map(|c| &c.node)
            .filter(|n| n.kind.is_named() && !n.kind.is_trivia())
    }

    /// Pre-order traversal including `self`.
    pub fn descendants(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|c| &c.node));
            Some(node)
        })
    }

    /// Leaves in document order.
    pub fn leaves(&self) -> impl Iterator<Item = &Self> {
        self.descendants().filter(|n| n.is_leaf())
    }

    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.text(source)
    }

    /// Number of nodes in this subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node.count()).sum::<usize>()
    }
}

/// Parse result: source, root and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    source: String,
    root: Node,
    diagnostics: Vec<Diagnostic>,
    lines: LineIndex,
}

impl Tree {
    #[must_use]
    pub fn new(source: String, root: Node, diagnostics: Vec<Diagnostic>) -> Self {
        let lines = LineIndex::new(&source);
        Self {
            source,
            root,
            diagnostics,
            lines,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    #[must_use]
    pub const fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            node: &self.root,
            field: None,
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[must_use]
    pub const fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// 1-based position of a byte offset.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(&self.source, offset)
    }

    #[must_use]
    pub fn text(&self, node: &Node) -> &str {
        node.text(&self.source)
    }

    /// Deepest node whose span contains `offset`. Offsets on a boundary
    /// resolve to the node starting there.
    #[must_use]
    pub fn node_at_offset(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        if offset > self.source.len() {
            return None;
        }
        let mut current = self.root_node();
        'descend: loop {
            for child in current.children() {
                let span = child.span();
                if span.start <= offset && offset < span.end {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Smallest node whose span covers `span`.
    #[must_use]
    pub fn descendant_for_span(&self, span: Span) -> Option<SyntaxNode<'_>> {
        if !self.root.span.contains(span) {
            return None;
        }
        let mut current = self.root_node();
        while let Some(child) = current.children().find(|c| c.span().contains(span)) {
            current = child;
        }
        Some(current)
    }

    /// Ancestors of `target` from the root down to its parent, each
    /// with the field it fills in its own parent.
    pub(crate) fn path_to<'t>(&'t self, target: &Node) -> Option<Vec<(&'t Node, Option<Field>)>> {
        fn walk<'t>(
            node: &'t Node,
            field: Option<Field>,
            target: &Node,
            path: &mut Vec<(&'t Node, Option<Field>)>,
        ) -> bool {
            if std::ptr::eq(node, target) {
                return true;
            }
            if !node.span.contains(target.span) {
                return false;
            }
            path.push((node, field));
            for child in &node.children {
                if walk(&child.node, child.field, target, path) {
                    return true;
                }
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        walk(&self.root, None, target, &mut path).then_some(path)
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Tree", 2)?;
        state.serialize_field("root", &self.root)?;
        state.serialize_field("diagnostics", &self.diagnostics)?;
        state.end()
    }
}

/// A node together with the tree it belongs to, so it can answer
/// text, position and parent queries.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxNode<'a> {
    tree: &'a Tree,
    node: &'a Node,
    field: Option<Field>,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.node, other.node)
    }
}

impl Eq for SyntaxNode<'_> {}

impl<'a> SyntaxNode<'a> {
    #[must_use]
    pub const fn node(&self) -> &'a Node {
        self.node
    }

    #[must_use]
    pub const fn tree(&self) -> &'a Tree {
        self.tree
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.node.kind
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        self.node.span
    }

    /// Field this node fills in its parent.
    #[must_use]
    pub const fn field(&self) -> Option<Field> {
        self.field
    }

    #[must_use]
    pub fn text(&self) -> &'a str {
        self.node.span.text(&self.tree.source)
    }

    #[must_use]
    pub fn start_position(&self) -> Position {
        self.tree.position(self.node.span.start)
    }

    #[must_use]
    pub fn end_position(&self) -> Position {
        self.tree.position(self.node.span.end)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.node.kind.is_named()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.node.has_error()
    }

    const fn wrap(&self, child: &'a Child) -> Self {
        Self {
            tree: self.tree,
            node: &child.node,
            field: child.field,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = Self> + use<'a> {
        let this = *self;
        self.node.children.iter().map(move |c| this.wrap(c))
    }

    /// Named, non-trivia children.
    pub fn named_children(&self) -> impl Iterator<Item = Self> + use<'a> {
        self.children()
            .filter(|c| c.is_named() && !c.kind().is_trivia())
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        self.node.children.get(index).map(|c| self.wrap(c))
    }

    #[must_use]
    pub fn child_by_field(&self, field: Field) -> Option<Self> {
        self.children().find(|c| c.field == Some(field))
    }

    pub fn children_by_field(&self, field: Field) -> impl Iterator<Item = Self> + use<'a> {
        self.children().filter(move |c| c.field == Some(field))
    }

    #[must_use]
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<Self> {
        self.children().find(|c| c.kind() == kind)
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = Self> + use<'a> {
        self.children().filter(move |c| c.kind() == kind)
    }

    /// Pre-order traversal including `self`.
    pub fn descendants(&self) -> impl Iterator<Item = Self> + use<'a> {
        let mut stack = vec![*self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.node.children.iter().rev().map(|c| node.wrap(c)));
            Some(node)
        })
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let path = self.tree.path_to(self.node)?;
        let &(node, field) = path.last()?;
        Some(Self {
            tree: self.tree,
            node,
            field,
        })
    }

    /// Closest proper ancestor of `kind`.
    #[must_use]
    pub fn ancestor(&self, kind: NodeKind) -> Option<Self> {
        let path = self.tree.path_to(self.node)?;
        path.iter()
            .rev()
            .find(|(node, _)| node.kind == kind)
            .map(|&(node, field)| Self {
                tree: self.tree,
                node,
                field,
            })
    }

    fn siblings(&self) -> Option<(Self, usize)> {
        let parent = self.parent()?;
        let index = parent
            .node
            .children
            .iter()
            .position(|c| std::ptr::eq(&c.node, self.node))?;
        Some((parent, index))
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        let (parent, index) = self.siblings()?;
        parent.child(index + 1)
    }

    #[must_use]
    pub fn prev_sibling(&self) -> Option<Self> {
        let (parent, index) = self.siblings()?;
        parent.child(index.checked_sub(1)?)
    }

    /// Following siblings of `kind`, stopping at the first sibling of
    /// kind `until`.
    #[must_use]
    pub fn find_siblings_until(&self, kind: NodeKind, until: NodeKind) -> Vec<Self> {
        let Some((parent, index)) = self.siblings() else {
            return Vec::new();
        };
        parent
            .children()
            .skip(index + 1)
            .take_while(|c| c.kind() != until)
            .filter(|c| c.kind() == kind)
            .collect()
    }
}

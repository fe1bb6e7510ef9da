//! Typed views over CST nodes.
//!
//! Each view wraps a [`SyntaxNode`] of one kind and exposes its parts by
//! meaning. Accessors return `None` for parts that are missing because
//! of a syntax error; the underlying nodes stay reachable through
//! [`syntax`](Recipe::syntax).

use crate::cst::{Field, NodeKind, SyntaxNode, Tree};
use crate::token::{Keyword, StringKind, TokenKind};

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident => $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<'a>(SyntaxNode<'a>);

        impl<'a> $name<'a> {
            #[must_use]
            pub fn cast(node: SyntaxNode<'a>) -> Option<Self> {
                matches!(node.kind(), $(NodeKind::$kind)|+).then_some(Self(node))
            }

            #[must_use]
            pub const fn syntax(&self) -> SyntaxNode<'a> {
                self.0
            }
        }
    };
}

fn identifier<'a>(node: Option<SyntaxNode<'a>>) -> Option<&'a str> {
    node.filter(|n| n.kind() == NodeKind::Identifier)
        .map(|n| n.text())
}

fn has_token(node: SyntaxNode<'_>, kind: TokenKind) -> bool {
    node.children().any(|c| c.kind() == NodeKind::Token(kind))
}

fn cast_children<'a, T: 'a>(
    node: SyntaxNode<'a>,
    cast: fn(SyntaxNode<'a>) -> Option<T>,
) -> impl Iterator<Item = T> + 'a {
    node.children().filter_map(cast)
}

ast_node!(
    /// The whole file.
    SourceFile => SourceFile
);

impl<'a> SourceFile<'a> {
    #[must_use]
    pub const fn new(tree: &'a Tree) -> Self {
        Self(tree.root_node())
    }

    pub fn items(&self) -> impl Iterator<Item = Item<'a>> + use<'a> {
        cast_children(self.0, Item::cast)
    }

    pub fn recipes(&self) -> impl Iterator<Item = Recipe<'a>> + use<'a> {
        cast_children(self.0, Recipe::cast)
    }

    pub fn assignments(&self) -> impl Iterator<Item = Assignment<'a>> + use<'a> {
        self.items().filter_map(|item| match item {
            Item::Assignment(a) => Some(a),
            Item::Export(e) | Item::Unexport(e) => e.assignment(),
            _ => None,
        })
    }

    /// The `#!` line at the top of the file.
    #[must_use]
    pub fn shebang(&self) -> Option<Shebang<'a>> {
        self.0.child_of_kind(NodeKind::Shebang).map(Shebang)
    }

    #[must_use]
    pub fn recipe(&self, name: &str) -> Option<Recipe<'a>> {
        self.recipes().find(|r| r.name() == Some(name))
    }
}

/// A top-level item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    Alias(Alias<'a>),
    Assignment(Assignment<'a>),
    Export(Export<'a>),
    Unexport(Export<'a>),
    Import(Import<'a>),
    Module(Module<'a>),
    Setting(Setting<'a>),
    Recipe(Recipe<'a>),
}

impl<'a> Item<'a> {
    #[must_use]
    pub fn cast(node: SyntaxNode<'a>) -> Option<Self> {
        let item = match node.kind() {
            NodeKind::Alias => Self::Alias(Alias(node)),
            NodeKind::Assignment => Self::Assignment(Assignment(node)),
            NodeKind::Export => Self::Export(Export(node)),
            NodeKind::Unexport => Self::Unexport(Export(node)),
            NodeKind::Import => Self::Import(Import(node)),
            NodeKind::Module => Self::Module(Module(node)),
            NodeKind::Setting => Self::Setting(Setting(node)),
            NodeKind::Recipe => Self::Recipe(Recipe(node)),
            _ => return None,
        };
        Some(item)
    }

    #[must_use]
    pub const fn syntax(&self) -> SyntaxNode<'a> {
        match self {
            Self::Alias(n) => n.0,
            Self::Assignment(n) => n.0,
            Self::Export(n) | Self::Unexport(n) => n.0,
            Self::Import(n) => n.0,
            Self::Module(n) => n.0,
            Self::Setting(n) => n.0,
            Self::Recipe(n) => n.0,
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'a>> + use<'a> {
        cast_children(self.syntax(), Attribute::cast)
    }
}

ast_node!(
    /// `name := expression`
    Assignment => Assignment
);

impl<'a> Assignment<'a> {
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.0.child_by_field(Field::Left))
    }

    #[must_use]
    pub fn value(&self) -> Option<Expression<'a>> {
        self.0
            .child_by_field(Field::Right)
            .and_then(Expression::cast)
    }

    /// Whether the assignment sits inside `export`.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.0
            .parent()
            .is_some_and(|p| p.kind() == NodeKind::Export)
    }
}

ast_node!(
    /// `export name := value` or `unexport name := value`.
    Export => Export | Unexport
);

impl<'a> Export<'a> {
    #[must_use]
    pub fn assignment(&self) -> Option<Assignment<'a>> {
        self.0
            .child_of_kind(NodeKind::Assignment)
            .map(Assignment)
    }

    #[must_use]
    pub fn is_unexport(&self) -> bool {
        self.0.kind() == NodeKind::Unexport
    }
}

ast_node!(Alias => Alias);

impl<'a> Alias<'a> {
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.0.child_by_field(Field::Left))
    }

    /// Target recipe, `module::recipe` for module paths.
    #[must_use]
    pub fn target(&self) -> Option<&'a str> {
        self.0
            .child_by_field(Field::Right)
            .filter(|n| matches!(n.kind(), NodeKind::Identifier | NodeKind::ModulePath))
            .map(|n| n.text())
    }
}

ast_node!(Import => Import);

impl<'a> Import<'a> {
    #[must_use]
    pub fn path(&self) -> Option<StringLiteral<'a>> {
        self.0.child_of_kind(NodeKind::String).map(StringLiteral)
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        has_token(self.0, TokenKind::Question)
    }
}

ast_node!(
    /// `mod name` with an optional path.
    Module => Module
);

impl<'a> Module<'a> {
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.0.child_by_field(Field::Name))
    }

    #[must_use]
    pub fn path(&self) -> Option<StringLiteral<'a>> {
        self.0.child_of_kind(NodeKind::String).map(StringLiteral)
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        has_token(self.0, TokenKind::Question)
    }
}

ast_node!(Setting => Setting);

/// Right-hand side of a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue<'a> {
    Boolean(bool),
    String(StringLiteral<'a>),
    Array(Vec<StringLiteral<'a>>),
}

impl<'a> Setting<'a> {
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.0.child_by_field(Field::Left))
    }

    /// `None` for a bare `set name`, which means `true`.
    #[must_use]
    pub fn value(&self) -> Option<SettingValue<'a>> {
        let node = self.0.child_by_field(Field::Right)?;
        match node.kind() {
            NodeKind::Boolean => Some(SettingValue::Boolean(has_token(
                node,
                TokenKind::Keyword(Keyword::True),
            ))),
            NodeKind::String => Some(SettingValue::String(StringLiteral(node))),
            NodeKind::Array => Some(SettingValue::Array(
                node.children_by_field(Field::Element)
                    .filter_map(StringLiteral::cast)
                    .collect(),
            )),
            _ => None,
        }
    }
}

ast_node!(
    /// `[name, name(args), name: 'value']` before an item.
    Attribute => Attribute
);

/// One comma-separated entry of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEntry<'a> {
    Flag {
        name: &'a str,
    },
    Call {
        name: &'a str,
        arguments: Vec<AttributeArgument<'a>>,
    },
    KeyValue {
        name: &'a str,
        value: Option<StringLiteral<'a>>,
    },
}

impl<'a> AttributeEntry<'a> {
    #[must_use]
    pub const fn name(&self) -> &'a str {
        match self {
            Self::Flag { name } | Self::Call { name, .. } | Self::KeyValue { name, .. } => *name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeArgument<'a> {
    String(StringLiteral<'a>),
    Named {
        name: &'a str,
        value: Option<StringLiteral<'a>>,
    },
}

impl<'a> Attribute<'a> {
    #[must_use]
    pub fn entries(&self) -> Vec<AttributeEntry<'a>> {
        self.0
            .named_children()
            .filter_map(|entry| {
                let name = identifier(entry.child_by_field(Field::Name))?;
                match entry.kind() {
                    NodeKind::AttributeFlag => Some(AttributeEntry::Flag { name }),
                    NodeKind::AttributeCall => Some(AttributeEntry::Call {
                        name,
                        arguments: entry
                            .children_by_field(Field::Argument)
                            .filter_map(attribute_argument)
                            .collect(),
                    }),
                    NodeKind::AttributeKeyValue => Some(AttributeEntry::KeyValue {
                        name,
                        value: entry
                            .child_by_field(Field::Argument)
                            .and_then(StringLiteral::cast),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<AttributeEntry<'a>> {
        self.entries().into_iter().find(|e| e.name() == name)
    }
}

fn attribute_argument(node: SyntaxNode<'_>) -> Option<AttributeArgument<'_>> {
    match node.kind() {
        NodeKind::String => Some(AttributeArgument::String(StringLiteral(node))),
        NodeKind::AttributeNamedParam => Some(AttributeArgument::Named {
            name: identifier(node.child_by_field(Field::Name))?,
            value: node
                .child_by_field(Field::Value)
                .and_then(StringLiteral::cast),
        }),
        _ => None,
    }
}

ast_node!(Recipe => Recipe);

impl<'a> Recipe<'a> {
    fn header(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_of_kind(NodeKind::RecipeHeader)
    }

    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.header()?.child_by_field(Field::Name))
    }

    /// `@name:` suppresses echoing of every line.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.header()
            .is_some_and(|h| has_token(h, TokenKind::At))
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'a>> + use<'a> {
        cast_children(self.0, Attribute::cast)
    }

    /// Whether any attribute has an entry called `name`.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes().any(|a| a.entry(name).is_some())
    }

    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter<'a>> {
        self.header()
            .and_then(|h| h.child_of_kind(NodeKind::Parameters))
            .map(|p| p.children().filter_map(Parameter::cast).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency<'a>> {
        self.header()
            .and_then(|h| h.child_of_kind(NodeKind::Dependencies))
            .map(|d| d.children().filter_map(Dependency::cast).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn body(&self) -> Option<RecipeBody<'a>> {
        self.0
            .child_by_field(Field::Body)
            .and_then(RecipeBody::cast)
    }
}

/// How many values a variadic parameter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variadic {
    /// `*name`
    ZeroOrMore,
    /// `+name`
    OneOrMore,
}

ast_node!(
    /// A recipe parameter, plain or variadic.
    Parameter => Parameter | VariadicParameter
);

impl<'a> Parameter<'a> {
    fn inner(&self) -> Option<SyntaxNode<'a>> {
        if self.0.kind() == NodeKind::Parameter {
            Some(self.0)
        } else {
            self.0.child_of_kind(NodeKind::Parameter)
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.inner()?.child_by_field(Field::Name))
    }

    #[must_use]
    pub fn default(&self) -> Option<Value<'a>> {
        self.inner()?
            .child_by_field(Field::Default)
            .and_then(Value::cast)
    }

    /// `$name` exports the argument as an environment variable.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.inner()
            .is_some_and(|p| has_token(p, TokenKind::Dollar))
    }

    #[must_use]
    pub fn variadic(&self) -> Option<Variadic> {
        match self.0.child_by_field(Field::Kleene)?.kind() {
            NodeKind::Token(TokenKind::Star) => Some(Variadic::ZeroOrMore),
            NodeKind::Token(TokenKind::Plus) => Some(Variadic::OneOrMore),
            _ => None,
        }
    }
}

ast_node!(Dependency => Dependency);

impl<'a> Dependency<'a> {
    fn call(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_of_kind(NodeKind::DependencyExpression)
    }

    /// Recipe name, `module::recipe` for module paths.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        let holder = self.call().unwrap_or(self.0);
        holder
            .child_by_field(Field::Name)
            .filter(|n| matches!(n.kind(), NodeKind::Identifier | NodeKind::ModulePath))
            .map(|n| n.text())
    }

    /// Arguments of `(name arg...)`.
    pub fn arguments(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        self.call()
            .into_iter()
            .flat_map(|call| call.children().filter_map(Expression::cast))
    }

    /// Dependencies after `&&` run after the recipe body.
    #[must_use]
    pub fn is_subsequent(&self) -> bool {
        let mut sibling = self.0.prev_sibling();
        while let Some(node) = sibling {
            match node.kind() {
                NodeKind::Token(TokenKind::AmpAmp) => return true,
                NodeKind::Dependency => return false,
                _ => sibling = node.prev_sibling(),
            }
        }
        false
    }
}

ast_node!(RecipeBody => RecipeBody);

impl<'a> RecipeBody<'a> {
    #[must_use]
    pub fn shebang(&self) -> Option<Shebang<'a>> {
        self.0
            .child_by_field(Field::Shebang)
            .and_then(Shebang::cast)
    }

    pub fn lines(&self) -> impl Iterator<Item = RecipeLine<'a>> + use<'a> {
        cast_children(self.0, RecipeLine::cast)
    }
}

ast_node!(RecipeLine => RecipeLine);

/// A piece of a recipe line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    Text(&'a str),
    Interpolation(Interpolation<'a>),
}

impl<'a> RecipeLine<'a> {
    #[must_use]
    pub fn prefix(&self) -> Option<&'a str> {
        self.0
            .child_of_kind(NodeKind::RecipeLinePrefix)
            .map(|n| n.text())
    }

    /// `@` flips echoing for this line.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.prefix().is_some_and(|p| p.contains('@'))
    }

    /// `-` ignores a failing exit status.
    #[must_use]
    pub fn ignores_errors(&self) -> bool {
        self.prefix().is_some_and(|p| p.contains('-'))
    }

    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment<'a>> {
        self.0
            .children()
            .filter_map(|n| match n.kind() {
                NodeKind::Text => Some(Fragment::Text(n.text())),
                NodeKind::Interpolation => Some(Fragment::Interpolation(Interpolation(n))),
                _ => None,
            })
            .collect()
    }
}

ast_node!(Shebang => Shebang);

impl<'a> Shebang<'a> {
    /// The interpreter named by the line: the `env` argument or the last
    /// path component.
    #[must_use]
    pub fn language(&self) -> Option<&'a str> {
        self.0.child_of_kind(NodeKind::Language).map(|n| n.text())
    }

    /// Everything after `#!`.
    #[must_use]
    pub fn command(&self) -> &'a str {
        let text = self.0.text();
        text.strip_prefix("#!").unwrap_or(text).trim()
    }
}

ast_node!(
    /// `{{ expression }}`
    Interpolation => Interpolation
);

impl<'a> Interpolation<'a> {
    #[must_use]
    pub fn expression(&self) -> Option<Expression<'a>> {
        self.0.children().find_map(Expression::cast)
    }
}

ast_node!(Expression => Expression);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Concatenate,
    /// `/`
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind<'a> {
    Binary {
        left: Expression<'a>,
        operator: BinaryOperator,
        right: Option<Expression<'a>>,
    },
    If(IfExpression<'a>),
    Value(Value<'a>),
    /// An error node took the place of the expression.
    Invalid,
}

impl<'a> Expression<'a> {
    #[must_use]
    pub fn kind(&self) -> ExpressionKind<'a> {
        if let Some(left) = self.0.child_by_field(Field::Left).and_then(Self::cast) {
            let operator = if has_token(self.0, TokenKind::Plus) {
                BinaryOperator::Concatenate
            } else {
                BinaryOperator::Join
            };
            return ExpressionKind::Binary {
                left,
                operator,
                right: self.0.child_by_field(Field::Right).and_then(Self::cast),
            };
        }
        for child in self.0.named_children() {
            match child.kind() {
                NodeKind::Value => return ExpressionKind::Value(Value(child)),
                NodeKind::IfExpression => return ExpressionKind::If(IfExpression(child)),
                _ => {}
            }
        }
        ExpressionKind::Invalid
    }

    /// A leading `/` makes the path absolute.
    #[must_use]
    pub fn is_rooted(&self) -> bool {
        self.0
            .children()
            .find(|c| !c.kind().is_trivia())
            .is_some_and(|c| c.kind() == NodeKind::Token(TokenKind::Slash))
    }

    #[must_use]
    pub fn text(&self) -> &'a str {
        self.0.text()
    }
}

ast_node!(Value => Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind<'a> {
    Variable(&'a str),
    String(StringLiteral<'a>),
    Command(ExternalCommand<'a>),
    Call(FunctionCall<'a>),
    Parenthesized(Expression<'a>),
    /// A bare number or other invalid value.
    Invalid,
}

impl<'a> Value<'a> {
    #[must_use]
    pub fn kind(&self) -> ValueKind<'a> {
        for child in self.0.named_children() {
            match child.kind() {
                NodeKind::Identifier => return ValueKind::Variable(child.text()),
                NodeKind::String => return ValueKind::String(StringLiteral(child)),
                NodeKind::ExternalCommand => return ValueKind::Command(ExternalCommand(child)),
                NodeKind::FunctionCall => return ValueKind::Call(FunctionCall(child)),
                NodeKind::Expression => return ValueKind::Parenthesized(Expression(child)),
                _ => {}
            }
        }
        ValueKind::Invalid
    }
}

ast_node!(FunctionCall => FunctionCall);

impl<'a> FunctionCall<'a> {
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        identifier(self.0.child_by_field(Field::Name))
    }

    #[must_use]
    pub fn arguments(&self) -> Vec<Expression<'a>> {
        self.0
            .child_by_field(Field::Arguments)
            .map(|s| s.children().filter_map(Expression::cast).collect())
            .unwrap_or_default()
    }
}

ast_node!(IfExpression => IfExpression);

impl<'a> IfExpression<'a> {
    #[must_use]
    pub fn condition(&self) -> Option<Condition<'a>> {
        self.0.child_of_kind(NodeKind::Condition).map(Condition)
    }

    #[must_use]
    pub fn consequence(&self) -> Option<Expression<'a>> {
        self.0
            .child_by_field(Field::Consequence)
            .and_then(Expression::cast)
    }

    /// `else if` branches as condition and body pairs.
    #[must_use]
    pub fn else_ifs(&self) -> Vec<(Option<Condition<'a>>, Option<Expression<'a>>)> {
        self.0
            .children_of_kind(NodeKind::ElseIfClause)
            .map(|clause| {
                (
                    clause.child_of_kind(NodeKind::Condition).map(Condition),
                    clause
                        .child_by_field(Field::Body)
                        .and_then(Expression::cast),
                )
            })
            .collect()
    }

    /// Body of the final `else`.
    #[must_use]
    pub fn otherwise(&self) -> Option<Expression<'a>> {
        self.0
            .child_of_kind(NodeKind::ElseClause)?
            .child_by_field(Field::Body)
            .and_then(Expression::cast)
    }
}

ast_node!(Condition => Condition);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Matches,
}

impl<'a> Condition<'a> {
    #[must_use]
    pub fn left(&self) -> Option<Expression<'a>> {
        self.0
            .child_by_field(Field::Left)
            .and_then(Expression::cast)
    }

    /// `None` for a bare expression used as a condition.
    #[must_use]
    pub fn operator(&self) -> Option<ConditionOperator> {
        self.0.children().find_map(|c| match c.kind() {
            NodeKind::Token(TokenKind::EqualsEquals) => Some(ConditionOperator::Equals),
            NodeKind::Token(TokenKind::BangEquals) => Some(ConditionOperator::NotEquals),
            NodeKind::Token(TokenKind::EqualsTilde) => Some(ConditionOperator::Matches),
            _ => None,
        })
    }

    #[must_use]
    pub fn right(&self) -> Option<Expression<'a>> {
        self.0
            .child_by_field(Field::Right)
            .and_then(Expression::cast)
    }

    /// Pattern of a `=~` condition.
    #[must_use]
    pub fn regex(&self) -> Option<StringLiteral<'a>> {
        self.0
            .child_by_field(Field::Right)
            .filter(|n| n.kind() == NodeKind::RegexLiteral)?
            .child_of_kind(NodeKind::String)
            .map(StringLiteral)
    }
}

ast_node!(
    /// Any of the twelve string dialects.
    StringLiteral => String
);

impl<'a> StringLiteral<'a> {
    /// Dialect, from the opening delimiter.
    #[must_use]
    pub fn kind(&self) -> Option<StringKind> {
        StringKind::detect(self.0.text())
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        !self.0.descendants().any(|n| n.kind() == NodeKind::ErrorRecovery)
    }

    /// Raw text between the delimiters, escapes left as written.
    #[must_use]
    pub fn contents(&self) -> &'a str {
        let text = self.0.text();
        let Some(kind) = self.kind() else {
            return text;
        };
        let inner = text.get(kind.opening().len()..).unwrap_or_default();
        if self.is_terminated() {
            inner.strip_suffix(kind.closing()).unwrap_or(inner)
        } else {
            inner
        }
    }

    pub fn interpolations(&self) -> impl Iterator<Item = Interpolation<'a>> + use<'a> {
        let holder = self
            .0
            .child_of_kind(NodeKind::FormatString)
            .unwrap_or(self.0);
        cast_children(holder, Interpolation::cast)
    }
}

ast_node!(
    /// A backtick command, `` `cmd` `` or ```` ```cmd``` ````.
    ExternalCommand => ExternalCommand
);

impl<'a> ExternalCommand<'a> {
    #[must_use]
    pub fn is_indented(&self) -> bool {
        self.0.text().starts_with("```")
    }

    #[must_use]
    pub fn contents(&self) -> &'a str {
        self.0
            .child_of_kind(NodeKind::CommandBody)
            .map_or("", |n| n.text())
    }

    pub fn interpolations(&self) -> impl Iterator<Item = Interpolation<'a>> + use<'a> {
        self.0
            .child_of_kind(NodeKind::CommandBody)
            .into_iter()
            .flat_map(|body| cast_children(body, Interpolation::cast))
    }
}

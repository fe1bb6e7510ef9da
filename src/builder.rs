use crate::cst::{Child, Field, Node, NodeKind};
use crate::token::{Span, Token};

/// Position among the children of the currently open node, used to
/// wrap already-built children in a node decided on later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug)]
struct OpenNode {
    kind: NodeKind,
    field: Option<Field>,
    children: Vec<Child>,
}

/// Incremental tree construction.
///
/// Trivia is buffered and attached to whichever node is open when the
/// next real token or node arrives, so no non-root node starts or ends
/// with trivia. A field set with [`TreeBuilder::field`] applies to the
/// next node or token added.
#[derive(Debug)]
pub struct TreeBuilder {
    stack: Vec<OpenNode>,
    trivia: Vec<Token>,
    field: Option<Field>,
    offset: usize,
}

impl TreeBuilder {
    /// Start building with an open root of `kind`.
    #[must_use]
    pub fn new(root: NodeKind) -> Self {
        Self {
            stack: vec![OpenNode {
                kind: root,
                field: None,
                children: Vec::new(),
            }],
            trivia: Vec::new(),
            field: None,
            offset: 0,
        }
    }

    /// End of the last leaf added.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Field for the next child added.
    pub const fn field(&mut self, field: Field) {
        self.field = Some(field);
    }

    /// Queue trivia tokens.
    pub fn trivia(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.trivia.extend(tokens);
    }

    pub fn start_node(&mut self, kind: NodeKind) {
        self.flush_trivia();
        let field = self.field.take();
        self.stack.push(OpenNode {
            kind,
            field,
            children: Vec::new(),
        });
    }

    /// Close the innermost node and return its span. Pending trivia
    /// stays pending and lands in the parent.
    pub fn finish_node(&mut self) -> Span {
        if self.stack.len() < 2 {
            return Span::empty(self.offset);
        }
        let Some(open) = self.stack.pop() else {
            return Span::empty(self.offset);
        };
        let node = Node::branch(open.kind, open.children, self.offset);
        let span = node.span();
        self.push(Child {
            field: open.field,
            node,
        });
        span
    }

    /// Add a leaf.
    pub fn token(&mut self, kind: NodeKind, span: Span) {
        self.flush_trivia();
        let field = self.field.take();
        self.offset = span.end;
        self.push(Child {
            field,
            node: Node::leaf(kind, span),
        });
    }

    /// Add a zero-width leaf at the current offset.
    pub fn empty(&mut self, kind: NodeKind) -> Span {
        self.flush_trivia();
        let span = Span::empty(self.offset);
        self.token(kind, span);
        span
    }

    #[must_use]
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        Checkpoint(self.current().map_or(0, |open| open.children.len()))
    }

    /// Open a node of `kind` that adopts every child added since
    /// `checkpoint`.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind, field: Option<Field>) {
        self.flush_trivia();
        let children = match self.stack.last_mut() {
            Some(open) if checkpoint.0 <= open.children.len() => {
                open.children.split_off(checkpoint.0)
            }
            _ => Vec::new(),
        };
        self.stack.push(OpenNode {
            kind,
            field,
            children,
        });
    }

    /// Close every open node and return the root. Remaining trivia is
    /// attached to the root.
    #[must_use]
    pub fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.finish_node();
        }
        self.flush_trivia();
        match self.stack.pop() {
            Some(open) => Node::branch(open.kind, open.children, self.offset),
            None => Node::leaf(NodeKind::SourceFile, Span::empty(self.offset)),
        }
    }

    fn current(&self) -> Option<&OpenNode> {
        self.stack.last()
    }

    fn push(&mut self, child: Child) {
        if let Some(open) = self.stack.last_mut() {
            open.children.push(child);
        }
    }

    fn flush_trivia(&mut self) {
        for token in std::mem::take(&mut self.trivia) {
            self.offset = token.span.end;
            self.push(Child {
                field: None,
                node: Node::leaf(NodeKind::from_token(token.kind), token.span),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, Span::new(start, end))
    }

    #[test]
    fn trivia_goes_to_parent_before_node() {
        let mut builder = TreeBuilder::new(NodeKind::SourceFile);
        builder.trivia([tok(TokenKind::Whitespace, 0, 1)]);
        builder.start_node(NodeKind::Value);
        builder.token(NodeKind::Identifier, Span::new(1, 2));
        builder.finish_node();
        let root = builder.finish();

        let kinds: Vec<_> = root.children().iter().map(|c| c.node.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Token(TokenKind::Whitespace), NodeKind::Value]
        );
        assert_eq!(root.children()[1].node.span(), Span::new(1, 2));
    }

    #[test]
    fn trailing_trivia_is_not_inside_finished_node() {
        let mut builder = TreeBuilder::new(NodeKind::SourceFile);
        builder.start_node(NodeKind::Value);
        builder.token(NodeKind::Identifier, Span::new(0, 1));
        builder.trivia([tok(TokenKind::Whitespace, 1, 2)]);
        let span = builder.finish_node();
        let root = builder.finish();

        assert_eq!(span, Span::new(0, 1));
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.span(), Span::new(0, 2));
    }

    #[test]
    fn checkpoint_wraps_earlier_children() {
        let mut builder = TreeBuilder::new(NodeKind::SourceFile);
        let checkpoint = builder.checkpoint();
        builder.token(NodeKind::Identifier, Span::new(0, 1));
        builder.start_node_at(checkpoint, NodeKind::Expression, Some(Field::Left));
        builder.finish_node();
        let root = builder.finish();

        let child = &root.children()[0];
        assert_eq!(child.field, Some(Field::Left));
        assert_eq!(child.node.kind(), NodeKind::Expression);
        assert_eq!(child.node.children()[0].node.kind(), NodeKind::Identifier);
    }

    #[test]
    fn field_applies_to_next_child_only() {
        let mut builder = TreeBuilder::new(NodeKind::SourceFile);
        builder.field(Field::Name);
        builder.token(NodeKind::Identifier, Span::new(0, 1));
        builder.token(NodeKind::Identifier, Span::new(1, 2));
        let root = builder.finish();

        assert_eq!(root.children()[0].field, Some(Field::Name));
        assert_eq!(root.children()[1].field, None);
    }

    #[test]
    fn missing_leaf_is_zero_width() {
        let mut builder = TreeBuilder::new(NodeKind::SourceFile);
        builder.token(NodeKind::Identifier, Span::new(0, 3));
        let span = builder.empty(NodeKind::Missing);
        assert_eq!(span, Span::empty(3));
    }
}

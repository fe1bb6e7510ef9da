#![allow(dead_code)]

use justfile_cst::{NodeKind, Token, TokenKind, Tree, parse, to_sexp, tokenize};

/// Parse and assert the leaves reproduce the input.
pub fn parse_lossless(input: &str) -> Tree {
    let tree = parse(input);
    let rebuilt: String = tree
        .root()
        .leaves()
        .map(|leaf| leaf.text(input))
        .collect();
    assert_eq!(
        rebuilt, input,
        "leaves do not cover the input:\n--- expected ---\n{input}\n--- got ---\n{rebuilt}"
    );
    tree
}

/// Parse valid input and return its S-expression.
pub fn sexp(input: &str) -> String {
    let tree = parse_lossless(input);
    assert!(
        tree.diagnostics().is_empty(),
        "unexpected diagnostics for {input:?}: {:?}",
        tree.diagnostics()
    );
    to_sexp(&tree)
}

/// Diagnostic codes in order.
pub fn codes(input: &str) -> Vec<&'static str> {
    parse_lossless(input)
        .diagnostics()
        .iter()
        .map(|d| d.code())
        .collect()
}

/// Kinds of the root's named children.
pub fn item_kinds(tree: &Tree) -> Vec<&'static str> {
    tree.root()
        .named_children()
        .map(|n| n.kind().as_str())
        .collect()
}

/// Significant token kinds, trivia dropped.
pub fn token_kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

pub fn count(tokens: &[Token], kind: TokenKind) -> usize {
    tokens.iter().filter(|t| t.kind == kind).count()
}

pub fn count_nodes(tree: &Tree, kind: NodeKind) -> usize {
    tree.root().descendants().filter(|n| n.kind() == kind).count()
}

/// Deepest level of the tree, the root being 1.
pub fn depth(tree: &Tree) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(tree.root(), 1)];
    while let Some((node, level)) = stack.pop() {
        deepest = deepest.max(level);
        stack.extend(node.children().iter().map(|c| (&c.node, level + 1)));
    }
    deepest
}

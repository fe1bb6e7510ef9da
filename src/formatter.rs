//! S-expression rendering of a tree.
//!
//! Only named nodes are printed. Children that fill a field are
//! prefixed with the field name, e.g.
//! `(assignment left: (identifier) right: (expression (value (string))))`.

use std::fmt::Write as _;

use crate::cst::{Child, Field, Node, Tree};

/// Render the whole tree on one line.
#[must_use]
pub fn to_sexp(tree: &Tree) -> String {
    node_to_sexp(tree.root())
}

#[must_use]
pub fn node_to_sexp(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node, None, None);
    out
}

/// Render the whole tree with one node per line, indented two spaces
/// per level.
#[must_use]
pub fn to_pretty_sexp(tree: &Tree) -> String {
    let mut out = String::new();
    write_node(&mut out, tree.root(), None, Some(0));
    out.push('\n');
    out
}

fn named(children: &[Child]) -> impl Iterator<Item = &Child> {
    children.iter().filter(|c| c.node.kind().is_named())
}

fn write_node(out: &mut String, node: &Node, field: Option<Field>, depth: Option<usize>) {
    if let Some(field) = field {
        let _ = write!(out, "{field}: ");
    }
    out.push('(');
    out.push_str(node.kind().as_str());
    for child in named(node.children()) {
        match depth {
            Some(depth) => {
                out.push('\n');
                let _ = write!(out, "{:width$}", "", width = 2 * (depth + 1));
                write_node(out, &child.node, child.field, Some(depth + 1));
            }
            None => {
                out.push(' ');
                write_node(out, &child.node, child.field, None);
            }
        }
    }
    out.push(')');
}

//! Navigation over the tree: selectors, parents, siblings and offset
//! lookups.

mod common;

use common::parse_lossless;
use justfile_cst::{Field, NodeKind, Position, Span, parse};
use pretty_assertions::assert_eq;

const SOURCE: &str = "\
version := '1.0'

[private]
build target='debug': (setup target) && notify
  cargo build {{target}}

setup mode:
  mkdir -p out/{{mode}}

notify:
  echo done
";

fn texts(nodes: &[justfile_cst::SyntaxNode<'_>]) -> Vec<String> {
    nodes.iter().map(|n| n.text().to_string()).collect()
}

// -----------------------------------------------------------
// Selectors
// -----------------------------------------------------------

#[test]
fn selectors_by_kind() {
    let tree = parse_lossless(SOURCE);
    let root = tree.root_node();
    assert_eq!(root.find_all("recipe").len(), 3);
    assert_eq!(
        root.find("recipe[2] > recipe_header").map(|n| n.text()),
        Some("notify:")
    );
    assert_eq!(
        texts(&root.find_all("recipe_header > parameters")),
        vec!["target='debug'", "mode"]
    );
}

#[test]
fn selector_chains() {
    let tree = parse_lossless(SOURCE);
    let root = tree.root_node();
    assert_eq!(
        texts(&root.find_all("recipe_body interpolation")),
        vec!["{{target}}", "{{mode}}"]
    );
    assert_eq!(
        texts(&root.find_all("dependency_expression > expression")),
        vec!["target"]
    );
    let attribute = root.find("recipe attribute_flag").expect("should find flag");
    assert_eq!(attribute.text(), "private");
}

#[test]
fn selector_union_keeps_clause_order() {
    let tree = parse_lossless(SOURCE);
    let root = tree.root_node();
    let found = root.find_all("dependency, assignment");
    let kinds: Vec<_> = found.iter().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Dependency, NodeKind::Dependency, NodeKind::Assignment]
    );
}

#[test]
fn positional_selector_skips_trivia() {
    let tree = parse_lossless(SOURCE);
    let header = tree
        .root_node()
        .find("recipe_header")
        .expect("should find header");
    assert_eq!(header.find("@0").map(|n| n.text()), Some("build"));
    assert_eq!(header.find("@1").map(|n| n.kind()), Some(NodeKind::Parameters));
    assert!(header.find("@9").is_none());
}

#[test]
fn unknown_kind_matches_nothing() {
    let tree = parse(SOURCE);
    assert!(tree.root_node().find_all("no_such_kind").is_empty());
    assert!(tree.root_node().find("recipe[99]").is_none());
}

// -----------------------------------------------------------
// Parents and siblings
// -----------------------------------------------------------

#[test]
fn parent_and_field() {
    let tree = parse_lossless(SOURCE);
    let root = tree.root_node();
    let name = root
        .find("recipe_header > identifier")
        .expect("should find name");
    assert_eq!(name.field(), Some(Field::Name));
    let header = name.parent().expect("should have parent");
    assert_eq!(header.kind(), NodeKind::RecipeHeader);
    let recipe = name.ancestor(NodeKind::Recipe).expect("should be in recipe");
    assert!(recipe.text().starts_with("[private]"));
    assert!(root.parent().is_none());
    assert!(name.ancestor(NodeKind::Assignment).is_none());
}

#[test]
fn siblings_until() {
    let tree = parse_lossless("a := '1'\nb := '2'\nc:\n  x\nd := '3'\n");
    let root = tree.root_node();
    let first = root.find("assignment").expect("should find assignment");
    let following = first.find_siblings_until(NodeKind::Assignment, NodeKind::Recipe);
    assert_eq!(texts(&following), vec!["b := '2'\n"]);

    let recipe = root.find("recipe").expect("should find recipe");
    let after = recipe.next_sibling().expect("should have sibling");
    assert_eq!(after.kind(), NodeKind::Assignment);
    assert_eq!(after.prev_sibling(), Some(recipe));
}

// -----------------------------------------------------------
// Offsets and positions
// -----------------------------------------------------------

#[test]
fn node_at_offset_finds_deepest() {
    let tree = parse_lossless(SOURCE);
    let offset = SOURCE.find("setup mode").expect("should contain setup");
    let node = tree.node_at_offset(offset).expect("should find node");
    assert_eq!(node.kind(), NodeKind::Identifier);
    assert_eq!(node.text(), "setup");
    assert_eq!(node.start_position(), Position::new(7, 1));
    assert!(tree.node_at_offset(SOURCE.len() + 1).is_none());
}

#[test]
fn descendant_for_span() {
    let tree = parse_lossless(SOURCE);
    let start = SOURCE.find("'debug'").expect("should contain default");
    let node = tree
        .descendant_for_span(Span::new(start, start + 7))
        .expect("should find node");
    assert_eq!(node.kind(), NodeKind::String);
    assert_eq!(node.ancestor(NodeKind::Parameter).map(|p| p.text()), Some("target='debug'"));
}

#[test]
fn positions_use_lines_and_characters() {
    let tree = parse_lossless("x := 'é'\ny := x\n");
    let second = tree
        .root_node()
        .find("assignment[1]")
        .expect("should find second assignment");
    assert_eq!(second.start_position(), Position::new(2, 1));
    let value = tree.root_node().find("string").expect("should find string");
    assert_eq!(value.end_position(), Position::new(1, 9));
}

// -----------------------------------------------------------
// Serialization
// -----------------------------------------------------------

#[test]
fn tree_serializes_to_json() {
    let tree = parse("x := 1\n");
    let json = serde_json::to_value(&tree).expect("should serialize");
    assert_eq!(json["root"]["kind"], "source_file");
    assert_eq!(json["root"]["children"][0]["node"]["kind"], "assignment");
    assert_eq!(
        json["root"]["children"][0]["node"]["children"][0]["field"],
        "left"
    );
    assert_eq!(json["diagnostics"][0]["code"], "numeric_literal_as_value");
}

//! Grammar coverage through S-expressions.

mod common;

use common::{item_kinds, parse_lossless, sexp};
use pretty_assertions::assert_eq;

fn assert_sexp(input: &str, expected: &str) {
    assert_eq!(sexp(input), expected, "input: {input:?}");
}

// -----------------------------------------------------------
// Items
// -----------------------------------------------------------

#[test]
fn alias() {
    assert_sexp(
        "alias b := build\n",
        "(source_file (alias left: (identifier) right: (identifier)))",
    );
}

#[test]
fn alias_to_module_recipe() {
    assert_sexp(
        "alias t := tools::test\n",
        "(source_file (alias left: (identifier) right: (module_path (identifier) (identifier))))",
    );
}

#[test]
fn export_wraps_assignment() {
    assert_sexp(
        "export x := 'a'\n",
        "(source_file (export (assignment left: (identifier) right: (expression (value (string))))))",
    );
    assert_sexp(
        "unexport x := 'a'\n",
        "(source_file (unexport (assignment left: (identifier) right: (expression (value (string))))))",
    );
}

#[test]
fn keyword_named_variable() {
    assert_sexp(
        "export := 'a'\n",
        "(source_file (assignment left: (identifier) right: (expression (value (string)))))",
    );
}

#[test]
fn settings() {
    assert_sexp("set dotenv-load\n", "(source_file (setting left: (identifier)))");
    assert_sexp(
        "set export := true\n",
        "(source_file (setting left: (identifier) right: (boolean)))",
    );
    assert_sexp(
        "set tempdir := \"/tmp\"\n",
        "(source_file (setting left: (identifier) right: (string)))",
    );
    assert_sexp(
        "set shell := [\"bash\", \"-c\"]\n",
        "(source_file (setting left: (identifier) right: (array element: (string) element: (string))))",
    );
}

#[test]
fn imports_and_modules() {
    assert_sexp("import 'a.just'\n", "(source_file (import (string)))");
    assert_sexp("import? 'a.just'\n", "(source_file (import (string)))");
    assert_sexp("mod tools\n", "(source_file (module name: (identifier)))");
    assert_sexp(
        "mod? tools 'tools/mod.just'\n",
        "(source_file (module name: (identifier) (string)))",
    );
}

#[test]
fn comments_stay_in_place() {
    assert_sexp(
        "# c\nx := a # t\n",
        "(source_file (comment) (assignment left: (identifier) right: (expression (value (identifier))) (comment)))",
    );
}

#[test]
fn file_shebang() {
    assert_sexp(
        "#!/bin/sh\nx := 'a'\n",
        "(source_file (shebang (language)) (assignment left: (identifier) right: (expression (value (string)))))",
    );
}

#[test]
fn item_order_is_kept() {
    let tree = parse_lossless(
        "set quiet\n\
         alias d := deploy\n\
         version := '1'\n\
         mod ci\n\
         deploy:\n  echo\n\
         import 'extra.just'\n",
    );
    assert_eq!(
        item_kinds(&tree),
        vec!["setting", "alias", "assignment", "module", "recipe", "import"]
    );
}

// -----------------------------------------------------------
// Recipes
// -----------------------------------------------------------

#[test]
fn recipe_without_body() {
    assert_sexp(
        "build:\n",
        "(source_file (recipe (recipe_header name: (identifier))))",
    );
    assert_sexp(
        "@build:\n",
        "(source_file (recipe (recipe_header name: (identifier))))",
    );
}

#[test]
fn parameters() {
    assert_sexp(
        "build target='debug' $mode +rest:\n",
        "(source_file (recipe (recipe_header name: (identifier) (parameters \
         (parameter name: (identifier) default: (value (string))) \
         (parameter name: (identifier)) \
         (variadic_parameter (parameter name: (identifier)))))))",
    );
}

#[test]
fn parameter_default_may_be_parenthesized() {
    assert_sexp(
        "a x=(y + 'z'):\n",
        "(source_file (recipe (recipe_header name: (identifier) (parameters \
         (parameter name: (identifier) default: (value (expression \
         left: (expression (value (identifier))) right: (expression (value (string))))))))))",
    );
}

#[test]
fn dependencies() {
    assert_sexp(
        "a: b (c 'x') && d\n",
        "(source_file (recipe (recipe_header name: (identifier) (dependencies \
         (dependency name: (identifier)) \
         (dependency (dependency_expression name: (identifier) (expression (value (string))))) \
         (dependency name: (identifier))))))",
    );
}

#[test]
fn module_dependency() {
    assert_sexp(
        "a: tools::build\n",
        "(source_file (recipe (recipe_header name: (identifier) (dependencies \
         (dependency name: (module_path (identifier) (identifier)))))))",
    );
}

#[test]
fn body_lines() {
    assert_sexp(
        "a:\n  @echo {{x}}\n\n  -rm out\n",
        "(source_file (recipe (recipe_header name: (identifier)) body: (recipe_body \
         (recipe_line (recipe_line_prefix) (text) (interpolation (expression (value (identifier))))) \
         (recipe_line (recipe_line_prefix) (text)))))",
    );
}

#[test]
fn body_shebang() {
    assert_sexp(
        "a:\n  #!/usr/bin/env bash\n  echo\n",
        "(source_file (recipe (recipe_header name: (identifier)) body: (recipe_body \
         shebang: (shebang (language)) (recipe_line (text)))))",
    );
}

#[test]
fn consecutive_recipes() {
    let tree = parse_lossless("a:\n  one\nb:\n  two\n");
    assert!(tree.diagnostics().is_empty());
    assert_eq!(item_kinds(&tree), vec!["recipe", "recipe"]);
}

// -----------------------------------------------------------
// Attributes
// -----------------------------------------------------------

#[test]
fn attribute_forms() {
    assert_sexp(
        "[private]\n[group: 'ci', confirm('sure?')]\nbuild:\n",
        "(source_file (recipe \
         (attribute (attribute_flag name: (identifier))) \
         (attribute (attribute_key_value name: (identifier) argument: (string)) \
         (attribute_call name: (identifier) argument: (string))) \
         (recipe_header name: (identifier))))",
    );
}

#[test]
fn attribute_named_argument() {
    assert_sexp(
        "[arg('n', long='name')]\na n:\n",
        "(source_file (recipe \
         (attribute (attribute_call name: (identifier) argument: (string) \
         argument: (attribute_named_param name: (identifier) value: (string)))) \
         (recipe_header name: (identifier) (parameters (parameter name: (identifier))))))",
    );
}

#[test]
fn attributes_on_other_items() {
    let tree = parse_lossless("[private]\nx := 'a'\n[doc('tools')]\nmod tools\n");
    assert!(tree.diagnostics().is_empty());
    assert_eq!(item_kinds(&tree), vec!["assignment", "module"]);
}

// -----------------------------------------------------------
// Expressions
// -----------------------------------------------------------

#[test]
fn slash_binds_tighter_than_plus() {
    assert_sexp(
        "x := a + b / c\n",
        "(source_file (assignment left: (identifier) right: (expression \
         left: (expression (value (identifier))) \
         right: (expression left: (expression (value (identifier))) right: (expression (value (identifier)))))))",
    );
}

#[test]
fn operators_associate_left() {
    assert_sexp(
        "x := a / b + c\n",
        "(source_file (assignment left: (identifier) right: (expression \
         left: (expression left: (expression (value (identifier))) right: (expression (value (identifier)))) \
         right: (expression (value (identifier))))))",
    );
}

#[test]
fn function_call() {
    assert_sexp(
        "x := env('HOME', 'x')\n",
        "(source_file (assignment left: (identifier) right: (expression (value \
         (function_call name: (identifier) arguments: (sequence \
         (expression (value (string))) (expression (value (string)))))))))",
    );
    assert_sexp(
        "x := uuid()\n",
        "(source_file (assignment left: (identifier) right: (expression (value \
         (function_call name: (identifier))))))",
    );
}

#[test]
fn call_arguments_may_span_lines() {
    let tree = parse_lossless("x := join(\n  'a',\n  'b',\n)\n");
    assert!(tree.diagnostics().is_empty(), "{:?}", tree.diagnostics());
}

#[test]
fn if_else_chain() {
    assert_sexp(
        "x := if a == 'b' { c } else if d != e { f } else { g }\n",
        "(source_file (assignment left: (identifier) right: (expression (if_expression \
         (condition left: (expression (value (identifier))) right: (expression (value (string)))) \
         consequence: (expression (value (identifier))) \
         alternative: (else_if_clause \
         (condition left: (expression (value (identifier))) right: (expression (value (identifier)))) \
         body: (expression (value (identifier)))) \
         alternative: (else_clause body: (expression (value (identifier))))))))",
    );
}

#[test]
fn regex_condition() {
    assert_sexp(
        "x := if a =~ '^b' { c } else { d }\n",
        "(source_file (assignment left: (identifier) right: (expression (if_expression \
         (condition left: (expression (value (identifier))) right: (regex_literal (string))) \
         consequence: (expression (value (identifier))) \
         alternative: (else_clause body: (expression (value (identifier))))))))",
    );
}

#[test]
fn literals() {
    assert_sexp(
        "x := f'{{a}}'\n",
        "(source_file (assignment left: (identifier) right: (expression (value \
         (string (format_string (interpolation (expression (value (identifier))))))))))",
    );
    assert_sexp(
        "x := `ls {{d}}`\n",
        "(source_file (assignment left: (identifier) right: (expression (value \
         (external_command (command_body (interpolation (expression (value (identifier))))))))))",
    );
    assert_sexp(
        "x := \"a\\n\"\n",
        "(source_file (assignment left: (identifier) right: (expression (value \
         (string (escape_sequence))))))",
    );
}

#[test]
fn rooted_path() {
    assert_sexp(
        "x := / 'usr'\n",
        "(source_file (assignment left: (identifier) right: (expression (value (string)))))",
    );
}

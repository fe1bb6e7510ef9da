//! Error-tolerant justfile scanner and parser.
//!
//! Parsing never fails: any input produces a lossless concrete syntax
//! tree whose leaves concatenate back to the source, with error nodes
//! and diagnostics where the input is malformed.
//!
//! # Quick start
//!
//! ## Parse and inspect a justfile
//!
//! ```
//! use justfile_cst::{SourceFile, parse};
//!
//! let tree = parse("build target='debug':\n  cargo build --profile {{target}}\n");
//! assert!(!tree.has_errors());
//!
//! let file = SourceFile::new(&tree);
//! let recipe = file.recipe("build").unwrap();
//! assert_eq!(recipe.parameters()[0].name(), Some("target"));
//! ```
//!
//! ## Report syntax errors
//!
//! ```
//! use justfile_cst::parse;
//!
//! let tree = parse("x := 'unterminated\n");
//! let diagnostic = &tree.diagnostics()[0];
//! assert_eq!(diagnostic.code(), "unterminated_string");
//! assert_eq!(diagnostic.position.line, 1);
//! ```
//!
//! ## Find nodes with selectors
//!
//! ```
//! use justfile_cst::parse;
//!
//! let tree = parse("a: b\nb:\n");
//! let root = tree.root_node();
//! let dependency = root.find("recipe > recipe_header > dependencies").unwrap();
//! assert_eq!(dependency.text(), "b");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod cst;
pub mod diagnostic;
pub mod document;
pub mod formatter;
pub mod lexer;
pub mod parser;
mod query;
mod stream;
pub mod token;

use std::path::{Path, PathBuf};

pub use ast::{
    Alias, Assignment, Attribute, AttributeArgument, AttributeEntry, Dependency, Expression,
    ExpressionKind, Item, Recipe, RecipeBody, RecipeLine, Setting, SettingValue, SourceFile,
    StringLiteral, Value, ValueKind,
};
pub use cst::{Child, Field, Node, NodeKind, SyntaxNode, Tree};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use document::{Document, EditError, LineIndex, PositionCursor, Range, TextEdit};
pub use formatter::{to_pretty_sexp, to_sexp};
pub use lexer::{LexErrorKind, LexMode, Scanner, tokenize};
pub use parser::{ParseErrorKind, ParseOptions, parse, parse_with_options};
pub use token::{Position, Span, StringKind, Token, TokenKind};

/// Unified error type for the fallible entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The first syntax error in the input.
    #[error("{0}")]
    Syntax(#[from] Diagnostic),
    /// The file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A document edit could not be applied.
    #[error("{0}")]
    Edit(#[from] EditError),
}

/// Parse and fail on the first diagnostic.
pub fn parse_strict(input: &str) -> Result<Tree, Error> {
    let tree = parse(input);
    match tree.diagnostics().first() {
        Some(diagnostic) => Err(diagnostic.clone().into()),
        None => Ok(tree),
    }
}

/// Read and parse a file. Syntax errors stay in the returned tree.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Tree, Error> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} bytes from {}", content.len(), path.display());
    Ok(parse(&content))
}

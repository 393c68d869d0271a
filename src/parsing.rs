//! Python source parsing.
//!
//! Wraps tree-sitter with the Python grammar and rejects sources whose
//! parse tree contains syntax errors, so later passes can assume a
//! well-formed tree. Callers normally go through
//! [`crate::cache::AnalysisCache::parse`], which memoizes by source text.

use tree_sitter::{Node, Tree};

use crate::error::{LintError, Result};

/// A parse tree held together with the text it was produced from.
///
/// Node text extraction needs the original bytes, so the two travel
/// as one unit behind an `Arc` once cached.
#[derive(Debug)]
pub struct ParsedSource {
    pub text: String,
    pub tree: Tree,
}

impl ParsedSource {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Parse Python source text into a [`ParsedSource`].
///
/// # Errors
///
/// Returns `LintError::ParseFailure` if the grammar cannot be loaded or
/// the source contains syntax errors.
pub fn parse_python(source: &str) -> Result<ParsedSource> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| LintError::ParseFailure {
            message: format!("failed to load Python grammar: {e}"),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| LintError::ParseFailure {
            message: "parser produced no tree".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        return Err(LintError::ParseFailure {
            message: format!("syntax error near line {line}"),
        });
    }

    Ok(ParsedSource {
        text: source.to_string(),
        tree,
    })
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

/// Extract the source text for a node.
pub fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// 1-based line number of a node's first character.
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Visit every node in the tree under `root`, depth-first.
pub fn visit_all<'a, F>(root: &Node<'a>, mut visit: F)
where
    F: FnMut(&Node<'a>),
{
    let mut cursor = root.walk();
    let mut reached_root = false;

    while !reached_root {
        visit(&cursor.node());

        if cursor.goto_first_child() {
            continue;
        }
        if cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                reached_root = true;
                break;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

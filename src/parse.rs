//! Tree-sitter parsing wrapper for Rust source.
//!
//! The weaver treats the parser as a black box that turns text into a syntax
//! tree with line-accurate positions. Tree-sitter is error-tolerant, so a
//! tree whose root contains ERROR nodes still exists; for weaving purposes
//! such a tree is unusable and reported as a [`WeaveError::Parse`].

use crate::error::WeaveError;
use tree_sitter::Tree;

/// Parser for Rust source text
pub struct SourceParser {
    /// tree-sitter parser for Rust grammar
    parser: tree_sitter::Parser,
}

impl SourceParser {
    /// Create a new parser for Rust source code
    pub fn new() -> anyhow::Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language = tree_sitter_rust::language();
        parser.set_language(&language)?;

        Ok(Self { parser })
    }

    /// Parse source text into a syntax tree
    ///
    /// # Returns
    /// The tree, or [`WeaveError::Parse`] when tree-sitter fails outright or
    /// the resulting tree contains syntax errors.
    pub fn parse(&mut self, source: &str) -> Result<Tree, WeaveError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| WeaveError::Parse("tree-sitter returned no tree".to_string()))?;

        if tree.root_node().has_error() {
            return Err(WeaveError::Parse("source contains syntax errors".to_string()));
        }

        Ok(tree)
    }

    /// Parse leniently: return the tree even when it contains syntax errors
    ///
    /// Used to validate around-rewrites, where the caller inspects
    /// `root_node().has_error()` itself.
    pub fn parse_lenient(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new().expect("Failed to create parser")
    }
}

/// Source text of a node, with bounds checking
///
/// Returns an empty string if the node's byte range is out of bounds or not
/// valid UTF-8, rather than panicking on malformed input.
pub fn node_text<'a>(node: &tree_sitter::Node, source: &'a str) -> &'a str {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse("fn main() {}\n").unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn test_parse_rejects_broken_source() {
        let mut parser = SourceParser::new().unwrap();
        let result = parser.parse("fn main( {{{\n");
        assert!(matches!(result, Err(WeaveError::Parse(_))));
    }

    #[test]
    fn test_node_text_is_bounds_safe() {
        let mut parser = SourceParser::new().unwrap();
        let source = "fn tiny() {}\n";
        let tree = parser.parse(source).unwrap();
        let root = tree.root_node();

        assert_eq!(node_text(&root, source), source);
        // A truncated source slice must not panic
        assert_eq!(node_text(&root, ""), "");
    }
}

//! Call-site matching.
//!
//! A call pointcut names a callee; every call expression invoking that bare
//! name matches, regardless of scope, receiver, or argument count. The match
//! location is the call's opening-delimiter line, which is where before/after
//! blocks are spliced relative to.

use super::{invoked_name, walk_tree, MatchResult};
use crate::aspect::{Pointcut, PointcutKind};
use tree_sitter::Node;

/// Scan a parsed buffer for call sites matching a call pointcut
///
/// # Arguments
/// * `root` - Root node of the buffer's syntax tree
/// * `source` - Source text the tree was parsed from
/// * `pointcut` - Call-kind pointcut; its pattern is reduced to a bare name
///
/// # Returns
/// Match locations in ascending source-line order (the opening `(` line of
/// each matching call).
pub fn match_call_sites(root: Node, source: &str, pointcut: &Pointcut) -> Vec<MatchResult> {
    let target = pointcut.callee_name();
    if target.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();

    walk_tree(root, &mut |node: Node| {
        if node.kind() != "call_expression" {
            return;
        }

        let callee = match node.child_by_field_name("function") {
            Some(n) => n,
            None => return,
        };

        if invoked_name(callee, source) != Some(target) {
            return;
        }

        // Opening-delimiter line: where the argument list starts
        let open = node.child_by_field_name("arguments").unwrap_or(node);
        matches.push(MatchResult {
            line: open.start_position().row + 1,
            kind: PointcutKind::Call,
        });
    });

    matches.sort_by_key(|m| m.line);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SourceParser;

    fn pointcut(pattern: &str) -> Pointcut {
        Pointcut {
            kind: PointcutKind::Call,
            pattern: pattern.to_string(),
        }
    }

    fn matches_for(source: &str, pattern: &str) -> Vec<usize> {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        match_call_sites(tree.root_node(), source, &pointcut(pattern))
            .into_iter()
            .map(|m| m.line)
            .collect()
    }

    #[test]
    fn test_plain_call_matches_on_open_paren_line() {
        let source = "fn main() {\n    connect();\n}\n";
        assert_eq!(matches_for(source, "connect"), vec![2]);
    }

    #[test]
    fn test_two_calls_on_distinct_lines() {
        let source = "fn main() {\n    connect();\n    shutdown();\n    connect();\n}\n";
        assert_eq!(matches_for(source, "connect(...)"), vec![2, 4]);
    }

    #[test]
    fn test_scoped_and_method_calls_match_bare_name() {
        let source = "fn main() {\n    net::connect();\n    pool.connect();\n}\n";
        assert_eq!(matches_for(source, "net.connect"), vec![2, 3]);
    }

    #[test]
    fn test_no_argument_discrimination() {
        let source = "fn main() {\n    connect(1);\n    connect(1, 2, 3);\n}\n";
        assert_eq!(matches_for(source, "connect(addr)"), vec![2, 3]);
    }

    #[test]
    fn test_unrelated_calls_do_not_match() {
        let source = "fn main() {\n    reconnect();\n}\n";
        assert!(matches_for(source, "connect").is_empty());
    }
}

//! Text-block and import injection.
//!
//! Insertion is line-oriented: a block always lands as whole lines
//! immediately before a 1-indexed target line. Drift bookkeeping is the
//! caller's contract: within one phase, each target line must already be
//! adjusted by the cumulative line count of every prior insertion, because
//! each insertion physically shifts everything below it.

use crate::parse::node_text;
use tree_sitter::Node;

/// Insert `block` as whole lines immediately before 1-indexed `line`
///
/// Targets past the end of the buffer append at the end; targets below 1
/// clamp to the top. An empty block is a no-op.
pub fn insert_block(text: &str, line: usize, block: &str) -> String {
    if block.is_empty() {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    let idx = line.saturating_sub(1).min(lines.len());

    for (offset, block_line) in block.lines().enumerate() {
        lines.insert(idx + offset, block_line);
    }

    lines.join("\n")
}

/// Number of physical lines a block occupies once inserted
pub fn block_line_count(block: &str) -> usize {
    block.lines().count()
}

/// Ensure each import spec exists in the file exactly once
///
/// Missing specs are appended as `use <spec>;` lines after the last
/// top-level `use` declaration (or above the first item when the file has
/// no import block). Specs already present and duplicates within the
/// request are no-ops. The existing import block is never reordered.
///
/// # Arguments
/// * `text` - Current buffer text
/// * `root` - Root node of a tree parsed from `text`
/// * `specs` - Requested `use` paths (e.g. `std::time::Instant`)
///
/// # Returns
/// The updated text and the number of lines added.
pub fn ensure_imports(text: &str, root: Node, specs: &[String]) -> (String, usize) {
    let existing = existing_import_paths(root, text);

    let mut missing: Vec<&str> = Vec::new();
    for spec in specs {
        let spec = spec.trim();
        if spec.is_empty() || existing.iter().any(|e| e == spec) {
            continue;
        }
        if missing.iter().any(|m| *m == spec) {
            continue;
        }
        missing.push(spec);
    }

    if missing.is_empty() {
        return (text.to_string(), 0);
    }

    let block = missing
        .iter()
        .map(|spec| format!("use {};", spec))
        .collect::<Vec<_>>()
        .join("\n");
    let added = missing.len();

    (insert_block(text, import_insert_line(root), &block), added)
}

/// Paths of the file's top-level `use` declarations
fn existing_import_paths(root: Node, source: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() != "use_declaration" {
            continue;
        }
        if let Some(arg) = child.child_by_field_name("argument") {
            paths.push(node_text(&arg, source).trim().to_string());
        }
    }
    paths
}

/// Line where appended imports land: after the last top-level `use`
///
/// Without an import block, new imports go above the first item that is not
/// an inner attribute or leading comment, so crate-level docs stay on top.
fn import_insert_line(root: Node) -> usize {
    let mut last_use_end: Option<usize> = None;
    let mut first_item_line: Option<usize> = None;
    let mut last_child_end = 0;

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        last_child_end = child.end_position().row + 1;
        match child.kind() {
            "use_declaration" | "extern_crate_declaration" => {
                last_use_end = Some(child.end_position().row + 1);
            }
            "inner_attribute" | "line_comment" | "block_comment" => {}
            _ => {
                if first_item_line.is_none() {
                    first_item_line = Some(child.start_position().row + 1);
                }
            }
        }
    }

    if let Some(end) = last_use_end {
        return end + 1;
    }
    first_item_line.unwrap_or(last_child_end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SourceParser;

    #[test]
    fn test_insert_block_before_line() {
        let text = "one\ntwo\nthree\n";
        assert_eq!(insert_block(text, 2, "mid"), "one\nmid\ntwo\nthree\n");
    }

    #[test]
    fn test_insert_multiline_block() {
        let text = "one\ntwo\n";
        assert_eq!(insert_block(text, 1, "a\nb"), "a\nb\none\ntwo\n");
        assert_eq!(block_line_count("a\nb"), 2);
    }

    #[test]
    fn test_insert_past_eof_appends() {
        let text = "one\n";
        assert_eq!(insert_block(text, 99, "tail"), "one\ntail\n");
    }

    #[test]
    fn test_insert_empty_block_is_noop() {
        assert_eq!(insert_block("one\n", 1, ""), "one\n");
        assert_eq!(block_line_count(""), 0);
    }

    fn ensure(text: &str, specs: &[&str]) -> (String, usize) {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse(text).unwrap();
        let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
        ensure_imports(text, tree.root_node(), &specs)
    }

    #[test]
    fn test_missing_import_appended_after_block() {
        let text = "use std::fmt;\n\nfn main() {}\n";
        let (out, added) = ensure(text, &["std::io"]);
        assert_eq!(added, 1);
        assert_eq!(out, "use std::fmt;\nuse std::io;\n\nfn main() {}\n");
    }

    #[test]
    fn test_present_import_is_noop() {
        let text = "use std::fmt;\n\nfn main() {}\n";
        let (out, added) = ensure(text, &["std::fmt"]);
        assert_eq!(added, 0);
        assert_eq!(out, text);
    }

    #[test]
    fn test_duplicate_request_added_once() {
        let text = "use std::fmt;\n\nfn main() {}\n";
        let (out, added) = ensure(text, &["std::io", "std::io"]);
        assert_eq!(added, 1);
        assert_eq!(out.matches("use std::io;").count(), 1);
    }

    #[test]
    fn test_no_import_block_inserts_above_first_item() {
        let text = "//! Crate docs.\n\nfn main() {}\n";
        let (out, added) = ensure(text, &["std::io"]);
        assert_eq!(added, 1);
        assert_eq!(out, "//! Crate docs.\n\nuse std::io;\nfn main() {}\n");
    }
}

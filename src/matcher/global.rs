//! File-scope anchor computation for global advice.
//!
//! Global advice lands once per file, on the line immediately following the
//! last import declaration. The once-only guard lives in the engine's
//! session state; this module only computes where the anchor is.

use tree_sitter::Node;

/// Anchor line for global advice: the line after the last import declaration
///
/// Only top-level `use` and `extern crate` declarations count as the import
/// block. Files without imports fall back to the first top-level item's
/// line, and an empty file anchors at line 1.
pub fn global_anchor_line(root: Node) -> usize {
    let mut last_import_end: Option<usize> = None;
    let mut first_item_line: Option<usize> = None;

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "use_declaration" | "extern_crate_declaration" => {
                last_import_end = Some(child.end_position().row + 1);
            }
            "inner_attribute" | "line_comment" | "block_comment" => {}
            _ => {
                if first_item_line.is_none() {
                    first_item_line = Some(child.start_position().row + 1);
                }
            }
        }
    }

    if let Some(end) = last_import_end {
        return end + 1;
    }
    first_item_line.unwrap_or(1)
}

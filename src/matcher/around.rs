//! Around-advice: structural expression-template matching and rewriting.
//!
//! Pattern and replacement are each a single expression template. An
//! identifier consisting of one lowercase letter is a wildcard: it matches
//! any subexpression in that position and captures its source text; the same
//! letter used twice must capture textually identical subexpressions.
//!
//! Matching is top-down and outermost-first; a matched subtree is not
//! re-entered, so occurrences nested inside a match are left for a later
//! pass over the freshly serialized buffer.

use crate::error::WeaveError;
use crate::parse::{node_text, SourceParser};
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

/// A parsed single-expression template
///
/// Templates are parsed inside a throwaway function wrapper because the
/// grammar only accepts items at file scope. The wrapper text is kept so
/// template nodes can be sliced for comparison and instantiation.
pub struct ExprTemplate {
    /// Wrapper source the template was parsed inside
    wrapper: String,
    /// Parse of the wrapper
    tree: Tree,
}

impl ExprTemplate {
    /// Parse a template expression
    ///
    /// Fails with [`WeaveError::Parse`] when the text is not a valid
    /// expression (statements and items are out of scope for around advice).
    pub fn parse(parser: &mut SourceParser, text: &str) -> Result<Self, WeaveError> {
        let wrapper = format!("fn __template() {{\n{}\n}}\n", text);
        let tree = parser.parse(&wrapper)?;

        let template = ExprTemplate { wrapper, tree };
        // Reject templates that do not reduce to one expression
        if template.expr_node().is_none() {
            return Err(WeaveError::Parse(format!(
                "template is not a single expression: {}",
                text
            )));
        }
        Ok(template)
    }

    /// The template's expression node inside the wrapper
    fn expr_node(&self) -> Option<Node> {
        let root = self.tree.root_node();
        let func = root.named_child(0)?;
        if func.kind() != "function_item" {
            return None;
        }
        let body = func.child_by_field_name("body")?;
        if body.named_child_count() != 1 {
            return None;
        }
        let stmt = body.named_child(0)?;
        // A trailing `;` in the template wraps the expression in a statement
        if stmt.kind() == "expression_statement" {
            return stmt.named_child(0);
        }
        Some(stmt)
    }

    /// Source text of the template expression
    fn expr_text(&self) -> &str {
        match self.expr_node() {
            Some(node) => node_text(&node, &self.wrapper),
            None => "",
        }
    }
}

/// A planned subtree replacement, to be spliced by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRewrite {
    /// Byte range of the matched subtree in the buffer
    pub byte_start: usize,
    /// End of the matched subtree (exclusive)
    pub byte_end: usize,
    /// 1-indexed line the match starts on
    pub line: usize,
    /// Instantiated replacement text
    pub replacement: String,
}

/// Scan a parsed buffer for subtrees matching `pattern` and plan their rewrites
///
/// Matches are yielded in document order; overlapping matches are excluded
/// because matched subtrees are never re-entered. Splicing the planned
/// rewrites in descending byte order leaves earlier ranges valid.
pub fn plan_rewrites(
    root: Node,
    source: &str,
    pattern: &ExprTemplate,
    replacement: &ExprTemplate,
) -> Vec<PlannedRewrite> {
    let pat = match pattern.expr_node() {
        Some(p) => p,
        None => return Vec::new(),
    };
    // A bare wildcard would match every node in the file; treat as no match
    if is_wildcard(pat, &pattern.wrapper) {
        return Vec::new();
    }

    let mut rewrites = Vec::new();
    scan(root, source, pat, pattern, replacement, &mut rewrites);
    rewrites
}

fn scan(
    node: Node,
    source: &str,
    pat: Node,
    pattern: &ExprTemplate,
    replacement: &ExprTemplate,
    rewrites: &mut Vec<PlannedRewrite>,
) {
    if node.kind() == pat.kind() {
        let mut bindings = HashMap::new();
        if nodes_match(pat, &pattern.wrapper, node, source, &mut bindings) {
            rewrites.push(PlannedRewrite {
                byte_start: node.start_byte(),
                byte_end: node.end_byte(),
                line: node.start_position().row + 1,
                replacement: instantiate(replacement, &bindings),
            });
            // Matched subtrees are not re-entered
            return;
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        scan(child, source, pat, pattern, replacement, rewrites);
    }
}

/// Wildcard rule: an identifier whose text is a single lowercase letter
fn is_wildcard(node: Node, source: &str) -> bool {
    if node.kind() != "identifier" {
        return false;
    }
    let text = node_text(&node, source);
    text.len() == 1 && text.chars().all(|c| c.is_ascii_lowercase())
}

/// Structural equality of a template node against a buffer node
///
/// Kinds must agree level by level and leaf tokens must be textually equal,
/// except wildcards, which capture the candidate subexpression. A repeated
/// wildcard letter only matches if its captures are textually identical.
fn nodes_match(
    pat: Node,
    pat_src: &str,
    node: Node,
    src: &str,
    bindings: &mut HashMap<String, String>,
) -> bool {
    if is_wildcard(pat, pat_src) {
        let name = node_text(&pat, pat_src).to_string();
        let capture = node_text(&node, src).to_string();
        return match bindings.get(&name) {
            Some(prev) => *prev == capture,
            None => {
                bindings.insert(name, capture);
                true
            }
        };
    }

    if pat.kind() != node.kind() {
        return false;
    }

    if pat.child_count() == 0 {
        return node_text(&pat, pat_src) == node_text(&node, src);
    }

    if pat.child_count() != node.child_count() {
        return false;
    }

    for i in 0..pat.child_count() {
        let (pc, nc) = match (pat.child(i), node.child(i)) {
            (Some(p), Some(n)) => (p, n),
            _ => return false,
        };
        if !nodes_match(pc, pat_src, nc, src, bindings) {
            return false;
        }
    }

    true
}

/// Instantiate a replacement template with the pattern's captures
///
/// Wildcard positions in the replacement text are spliced right-to-left so
/// earlier byte offsets stay valid; letters with no capture are left as-is.
fn instantiate(replacement: &ExprTemplate, bindings: &HashMap<String, String>) -> String {
    let expr = match replacement.expr_node() {
        Some(e) => e,
        None => return replacement.expr_text().to_string(),
    };
    let base = expr.start_byte();
    let mut out = node_text(&expr, &replacement.wrapper).to_string();

    let mut holes: Vec<(usize, usize, String)> = Vec::new();
    collect_wildcards(expr, &replacement.wrapper, &mut holes);

    for (start, end, name) in holes.into_iter().rev() {
        if let Some(capture) = bindings.get(&name) {
            out.replace_range(start - base..end - base, capture);
        }
    }

    out
}

fn collect_wildcards(node: Node, source: &str, holes: &mut Vec<(usize, usize, String)>) {
    if is_wildcard(node, source) {
        holes.push((
            node.start_byte(),
            node.end_byte(),
            node_text(&node, source).to_string(),
        ));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_wildcards(child, source, holes);
    }
}

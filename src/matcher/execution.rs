//! Execution-joinpoint matching over function declarations.
//!
//! A match carries the body's delimiter lines and whether the function
//! declares a return type, which decides where after-advice lands: functions
//! with a result get the block immediately above the trailing statement so
//! it runs before any value leaves the body.

use super::walk_tree;
use crate::aspect::Pointcut;
use crate::parse::node_text;
use tree_sitter::Node;

/// A function body selected by an execution pointcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSite {
    /// Declared function name
    pub name: String,
    /// 1-indexed line of the body's opening delimiter
    pub open_line: usize,
    /// 1-indexed line of the body's closing delimiter
    pub close_line: usize,
    /// Whether the function declares a return type
    pub has_return: bool,
}

/// Scan a parsed buffer for function declarations matching an execution pointcut
///
/// Name rule: the declared name must equal the pattern name; an empty pattern
/// name is a wildcard that matches every function by its own name.
///
/// Parameter rule: each comma-separated token of the pattern's parameter text
/// must appear as a substring of the corresponding declared parameter's text.
/// A pattern with more tokens than declared parameters does not match; an
/// empty parameter pattern matches vacuously.
///
/// # Returns
/// Sites in ascending source order.
pub fn match_executions(root: Node, source: &str, pointcut: &Pointcut) -> Vec<ExecutionSite> {
    let pattern_name = pointcut.function_name();
    let param_pattern = pointcut.param_pattern().unwrap_or("");

    let mut sites = Vec::new();

    walk_tree(root, &mut |node: Node| {
        if node.kind() != "function_item" {
            return;
        }

        let name = match node.child_by_field_name("name") {
            Some(n) => node_text(&n, source),
            None => return,
        };

        if !pattern_name.is_empty() && name != pattern_name {
            return;
        }

        let params = match node.child_by_field_name("parameters") {
            Some(p) => p,
            None => return,
        };
        if !params_contain(params, source, param_pattern) {
            return;
        }

        let body = match node.child_by_field_name("body") {
            Some(b) => b,
            None => return,
        };

        sites.push(ExecutionSite {
            name: name.to_string(),
            open_line: body.start_position().row + 1,
            close_line: body.end_position().row + 1,
            has_return: node.child_by_field_name("return_type").is_some(),
        });
    });

    sites.sort_by_key(|s| s.open_line);
    sites
}

/// Coarse containment check of a parameter pattern against declared parameters
///
/// This is substring containment, not structural equality: `"req"` matches a
/// declared `req: Request`, and `": usize"` matches any usize parameter in
/// that position.
fn params_contain(params: Node, source: &str, pattern: &str) -> bool {
    let wanted: Vec<&str> = pattern
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if wanted.is_empty() {
        return true;
    }

    let mut declared = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "parameter" | "self_parameter" | "variadic_parameter" => {
                declared.push(node_text(&child, source));
            }
            _ => {}
        }
    }

    if wanted.len() > declared.len() {
        return false;
    }

    wanted
        .iter()
        .zip(declared.iter())
        .all(|(want, decl)| decl.contains(want))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::PointcutKind;
    use crate::parse::SourceParser;

    fn sites_for(source: &str, pattern: &str) -> Vec<ExecutionSite> {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let pointcut = Pointcut {
            kind: PointcutKind::Execution,
            pattern: pattern.to_string(),
        };
        match_executions(tree.root_node(), source, &pointcut)
    }

    #[test]
    fn test_named_function_matches() {
        let source = "fn handle() {\n    step();\n}\n";
        let sites = sites_for(source, "handle()");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "handle");
        assert_eq!(sites[0].open_line, 1);
        assert_eq!(sites[0].close_line, 3);
        assert!(!sites[0].has_return);
    }

    #[test]
    fn test_empty_name_is_wildcard() {
        let source = "fn first() {}\n\nfn second() {}\n";
        let sites = sites_for(source, "");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "first");
        assert_eq!(sites[1].name, "second");
    }

    #[test]
    fn test_return_type_detected() {
        let source = "fn total() -> u64 {\n    42\n}\n";
        let sites = sites_for(source, "total");
        assert!(sites[0].has_return);
    }

    #[test]
    fn test_param_containment_matches_substring() {
        let source = "fn handle(req: Request, depth: usize) {\n    step();\n}\n";
        assert_eq!(sites_for(source, "handle(req)").len(), 1);
        assert_eq!(sites_for(source, "handle(req, usize)").len(), 1);
        assert_eq!(sites_for(source, "handle(resp)").len(), 0);
    }

    #[test]
    fn test_more_pattern_tokens_than_params_rejected() {
        let source = "fn handle(req: Request) {\n    step();\n}\n";
        assert_eq!(sites_for(source, "handle(req, extra)").len(), 0);
    }

    #[test]
    fn test_sites_in_source_order() {
        let source = "fn a() {}\nfn b() {}\nfn c() {}\n";
        let names: Vec<String> = sites_for(source, "").into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}

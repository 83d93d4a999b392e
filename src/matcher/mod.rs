//! Joinpoint matchers.
//!
//! One strategy per pointcut kind, each a pure scan over (tree, source,
//! pattern) yielding match locations. Matchers never mutate the buffer;
//! insertion and drift bookkeeping belong to the injector and engine.

pub mod around;
pub mod call;
pub mod execution;
pub mod global;

pub use around::{plan_rewrites, ExprTemplate, PlannedRewrite};
pub use call::match_call_sites;
pub use execution::{match_executions, ExecutionSite};
pub use global::global_anchor_line;

use crate::aspect::PointcutKind;
use crate::parse::node_text;
use tree_sitter::Node;

/// A matched joinpoint location, produced transiently per match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// 1-indexed source line of the joinpoint
    pub line: usize,
    /// Which strategy produced the match
    pub kind: PointcutKind,
}

/// Walk a subtree in document order, calling `f` on every node
pub(crate) fn walk_tree<'t, F>(node: Node<'t>, f: &mut F)
where
    F: FnMut(Node<'t>),
{
    f(node);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_tree(child, f);
    }
}

/// Name a call expression invokes, if it has a simple one
///
/// Handles the callee shapes the weaver discriminates on:
/// - `connect(..)` - plain identifier
/// - `net::connect(..)` - scoped identifier, trailing name component
/// - `pool.connect(..)` - method call, field name
/// - `parse::<T>(..)` - generic function, recurse into its function
///
/// Closures, indexed callees and other exotic shapes yield `None`; no
/// receiver-type or argument discrimination is performed.
pub(crate) fn invoked_name<'a>(callee: Node, source: &'a str) -> Option<&'a str> {
    match callee.kind() {
        "identifier" => Some(node_text(&callee, source)),
        "scoped_identifier" => {
            let name = callee.child_by_field_name("name")?;
            Some(node_text(&name, source))
        }
        "field_expression" => {
            let field = callee.child_by_field_name("field")?;
            Some(node_text(&field, source))
        }
        "generic_function" => {
            let inner = callee.child_by_field_name("function")?;
            invoked_name(inner, source)
        }
        _ => None,
    }
}

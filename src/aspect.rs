//! Aspect declarations: pointcuts plus the advice woven at matched joinpoints.
//!
//! Aspects are pure data. They are loaded once from a JSON declaration file
//! and never mutated; their file order is the application order within a
//! weave phase.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of joinpoint a pointcut selects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PointcutKind {
    /// File scope: advice is anchored once per file, after the import block
    Global,
    /// Call sites of a named function or method
    Call,
    /// Function bodies (execution joinpoints)
    Execution,
    /// Expression subtrees matched structurally and rewritten in place
    Around,
}

impl PointcutKind {
    /// Return the normalized string key for this kind (used for CLI/JSON)
    pub fn normalized_key(&self) -> &'static str {
        match self {
            PointcutKind::Global => "global",
            PointcutKind::Call => "call",
            PointcutKind::Execution => "execution",
            PointcutKind::Around => "around",
        }
    }
}

/// A pattern selecting source locations to weave into
///
/// The pattern text is interpreted per kind:
/// - `Global`: ignored (the anchor is positional, not named)
/// - `Call`: a callee name, optionally qualified (`log::info`, `recv.send`)
///   and optionally suffixed with a parenthesized argument list
/// - `Execution`: a function name (empty = every function) plus an optional
///   declared-parameter text in parentheses
/// - `Around`: a single-expression template; identifiers consisting of one
///   lowercase letter are wildcards that capture any subexpression
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pointcut {
    /// Joinpoint kind this pointcut selects
    pub kind: PointcutKind,
    /// Pattern text, interpreted per kind
    pub pattern: String,
}

impl Pointcut {
    /// Bare callee name for call-site matching.
    ///
    /// Strips a trailing parenthesized suffix, then keeps only the component
    /// after the last qualifier separator (`::` or `.`), so `log::info(...)`
    /// and `self.timer.start` both reduce to their final name.
    pub fn callee_name(&self) -> &str {
        let name = self.pattern.split('(').next().unwrap_or("");
        let name = name.rsplit("::").next().unwrap_or(name);
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Function name for execution matching (empty = wildcard)
    pub fn function_name(&self) -> &str {
        self.pattern.split('(').next().unwrap_or("").trim()
    }

    /// Declared-parameter text of the pattern, if a parenthesized suffix exists
    ///
    /// `"do_work(count: usize)"` yields `Some("count: usize")`;
    /// `"do_work"` yields `None`.
    pub fn param_pattern(&self) -> Option<&str> {
        let open = self.pattern.find('(')?;
        let rest = &self.pattern[open + 1..];
        let close = rest.rfind(')')?;
        Some(&rest[..close])
    }
}

/// Code injected before, after, or around a joinpoint
///
/// `before`/`after` are line blocks spliced into the source text; `around`
/// is an expression template replacing the matched subtree. The model does
/// not forbid combining them, but in practice an aspect carries either
/// before/after blocks or an around template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Advice {
    /// Lines inserted before the joinpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Lines inserted after the joinpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Replacement expression template for around joinpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub around: Option<String>,
    /// `use` paths the advice code requires (e.g. `std::time::Instant`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

/// A cross-cutting concern: one pointcut and the advice applied at it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Aspect {
    /// Where to weave
    pub pointcut: Pointcut,
    /// What to weave
    pub advice: Advice,
}

/// On-disk aspect record as declared in the aspect file
///
/// Flat shape for author convenience; converted to [`Aspect`] on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AspectRecord {
    kind: PointcutKind,
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    around: Option<String>,
    #[serde(default)]
    imports: Vec<String>,
}

impl From<AspectRecord> for Aspect {
    fn from(rec: AspectRecord) -> Self {
        Aspect {
            pointcut: Pointcut {
                kind: rec.kind,
                pattern: rec.pattern,
            },
            advice: Advice {
                before: rec.before,
                after: rec.after,
                around: rec.around,
                imports: rec.imports,
            },
        }
    }
}

/// Load an ordered aspect list from a JSON declaration file
///
/// The file holds an array of records:
/// `[{"kind": "call", "pattern": "connect(...)", "before": "...", "imports": [...]}]`
///
/// # Arguments
/// * `path` - Path to the aspect declaration file
///
/// # Returns
/// Aspects in declaration order, or an error if the file is missing or malformed
pub fn load_aspects(path: &Path) -> Result<Vec<Aspect>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read aspect file: {}", path.display()))?;
    let records: Vec<AspectRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed aspect file: {}", path.display()))?;
    Ok(records.into_iter().map(Aspect::from).collect())
}

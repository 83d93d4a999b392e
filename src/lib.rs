//! Weft: an aspect-oriented source weaver for Rust code
//!
//! Weft rewrites existing source files so that designated joinpoints — file
//! scope, call sites, function bodies, and matched expression subtrees —
//! execute additional advice code before, after, or around the original
//! behavior, without otherwise altering program semantics.
//!
//! # Position Conventions
//!
//! Weft uses tree-sitter position conventions throughout:
//! - **Line positions**: 1-indexed (line 1 is the first line)
//! - **Byte offsets**: 0-indexed from file start
//!
//! # Weave Pass
//!
//! A pass over one file runs four phases in fixed order:
//! 1. **global** — file-scope advice anchored after the import block, at
//!    most once per file per session
//! 2. **call** — before/after blocks at matching call sites
//! 3. **execution** — before/after blocks inside matching function bodies
//! 4. **around** — structural expression rewrites, reparsed between aspects
//!
//! Every insertion is persisted immediately; parse and format failures are
//! logged, recorded in the [`WeaveReport`], and never abort a multi-file
//! run.

pub mod aspect;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod inject;
pub mod matcher;
pub mod parse;
pub mod report;
pub mod version;

pub use aspect::{load_aspects, Advice, Aspect, Pointcut, PointcutKind};
pub use buffer::SourceBuffer;
pub use engine::{collect_source_files, WeaveEngine, WeaveSession};
pub use error::WeaveError;
pub use inject::{block_line_count, ensure_imports, insert_block};
pub use matcher::{
    global_anchor_line, match_call_sites, match_executions, plan_rewrites, ExecutionSite,
    ExprTemplate, MatchResult, PlannedRewrite,
};
pub use parse::SourceParser;
pub use report::{
    generate_execution_id, output_json, FileReport, JsonResponse, OutputFormat, Phase,
    WeaveFailure, WeaveReport, WEFT_JSON_SCHEMA_VERSION,
};

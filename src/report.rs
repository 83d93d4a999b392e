//! Weave reports and CLI output.
//!
//! Every weave pass produces a report with per-file, per-phase match and
//! insertion counts plus the recoverable failures encountered. Counts are
//! surfaced explicitly so an aspect author can see a pointcut that matched
//! nothing, or many times, instead of guessing from the rewritten source.

use serde::{Deserialize, Serialize};

/// Current JSON output schema version
pub const WEFT_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper for all JSON responses
///
/// Every JSON response includes schema_version and execution_id for
/// parsing stability and traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for parsing stability
    pub schema_version: String,
    /// Unique execution ID for this run
    pub execution_id: String,
    /// Response data
    pub data: T,
}

impl<T> JsonResponse<T> {
    /// Create a new JSON response
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: WEFT_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            data,
        }
    }
}

/// Weave phase a failure or count belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// File read, before any weave phase ran
    Read,
    /// File-scope advice after the import block
    Global,
    /// Call-site advice
    Call,
    /// Function-body advice
    Execution,
    /// Structural expression rewrites
    Around,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Read => "read",
            Phase::Global => "global",
            Phase::Call => "call",
            Phase::Execution => "execution",
            Phase::Around => "around",
        };
        write!(f, "{}", name)
    }
}

/// A recoverable failure recorded during a file's weave pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaveFailure {
    /// Phase the failure occurred in
    pub phase: Phase,
    /// Human-readable description
    pub message: String,
}

/// Per-file weave results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileReport {
    /// File this report covers
    pub file: String,
    /// Whether global advice was applied during this pass
    pub global_applied: bool,
    /// Call joinpoints matched
    pub call_matches: usize,
    /// Execution joinpoints matched
    pub execution_matches: usize,
    /// Around rewrites actually applied
    pub around_rewrites: usize,
    /// Text blocks physically inserted (all phases)
    pub insertions: usize,
    /// Import lines added
    pub imports_added: usize,
    /// Recoverable failures encountered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<WeaveFailure>,
}

impl FileReport {
    /// Create an empty report for a file
    pub fn new(file: &std::path::Path) -> Self {
        FileReport {
            file: file.to_string_lossy().to_string(),
            ..FileReport::default()
        }
    }
}

/// Report of a full weave run over one or more files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaveReport {
    /// Per-file results, in processing order
    pub files: Vec<FileReport>,
}

impl WeaveReport {
    /// Total joinpoints matched across all files and phases
    pub fn total_matches(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.call_matches + f.execution_matches + f.around_rewrites)
            .sum()
    }

    /// Total failures recorded across all files
    pub fn total_failures(&self) -> usize {
        self.files.iter().map(|f| f.failures.len()).sum()
    }

    /// Check if the run completed without recoverable failures
    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Human,
    /// JSON output with schema versioning
    Json,
}

impl OutputFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(OutputFormat::Human),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Generate a unique execution ID for this run
///
/// Uses timestamp + process ID for uniqueness.
pub fn generate_execution_id() -> String {
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let pid = process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Print a value as pretty JSON to stdout
pub fn output_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print a weave report as human-readable text to stdout
pub fn print_human(report: &WeaveReport) {
    for file in &report.files {
        println!("{}", file.file);
        if file.global_applied {
            println!("  global advice applied");
        }
        println!(
            "  call: {}  execution: {}  around: {}  insertions: {}  imports: {}",
            file.call_matches,
            file.execution_matches,
            file.around_rewrites,
            file.insertions,
            file.imports_added
        );
        for failure in &file.failures {
            println!("  [{}] {}", failure.phase, failure.message);
        }
    }
    println!(
        "{} file(s), {} match(es), {} failure(s)",
        report.files.len(),
        report.total_matches(),
        report.total_failures()
    );
}

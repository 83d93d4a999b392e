//! The weave engine: a fixed four-phase pass per file.
//!
//! Phases run in order (global, call, execution, around); each phase fully
//! completes before the next begins. Within a phase, insertions are applied
//! in ascending source-line order against positions from the phase-entry
//! parse, with a running drift counter correcting each target line for the
//! lines inserted so far. The around phase is the only one that chains
//! structural rewrites, because it reparses from scratch between them.
//!
//! Every insertion and rewrite is persisted immediately; there is no write
//! buffering and no rollback. A parse or format failure skips that phase or
//! aspect, is logged, and never halts the rest of the run.

use crate::aspect::{Aspect, PointcutKind};
use crate::buffer::SourceBuffer;
use crate::error::WeaveError;
use crate::inject::{block_line_count, ensure_imports, insert_block};
use crate::matcher::{
    global_anchor_line, match_call_sites, match_executions, plan_rewrites, ExprTemplate,
};
use crate::parse::SourceParser;
use crate::report::{FileReport, Phase, WeaveFailure, WeaveReport};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Session state for a weave run
///
/// Tracks which files already received global advice, keyed per file path
/// rather than as one process-wide flag, so repeated or multi-file runs
/// behave correctly per file.
#[derive(Debug, Default)]
pub struct WeaveSession {
    woven: HashSet<PathBuf>,
}

impl WeaveSession {
    /// Create an empty session
    pub fn new() -> Self {
        WeaveSession::default()
    }

    /// Whether a file already received global advice in this session
    pub fn is_woven(&self, path: &Path) -> bool {
        self.woven.contains(path)
    }

    /// Mark a file as globally woven
    pub fn mark_woven(&mut self, path: &Path) {
        self.woven.insert(path.to_path_buf());
    }
}

/// Orchestrates weave passes over source files
pub struct WeaveEngine {
    aspects: Vec<Aspect>,
    parser: SourceParser,
    session: WeaveSession,
}

impl WeaveEngine {
    /// Create an engine for an ordered aspect list
    pub fn new(aspects: Vec<Aspect>) -> anyhow::Result<Self> {
        Ok(WeaveEngine {
            aspects,
            parser: SourceParser::new()?,
            session: WeaveSession::new(),
        })
    }

    /// Aspects this engine applies, in declaration order
    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    /// Run the full four-phase weave pass over one file
    ///
    /// The buffer is persisted after every insertion and rewrite, so the
    /// file on disk always reflects the pass so far. Recoverable failures
    /// are recorded in the report; only an unreadable file is an error.
    pub fn weave_file(&mut self, path: &Path) -> Result<FileReport, WeaveError> {
        let (_, report) = self.weave_file_text(path)?;
        Ok(report)
    }

    /// Like [`weave_file`](Self::weave_file), also returning the final woven text
    pub fn weave_file_text(&mut self, path: &Path) -> Result<(String, FileReport), WeaveError> {
        let mut buffer = SourceBuffer::read(path)?;
        let mut report = FileReport::new(path);

        apply_global_phase(
            &mut self.parser,
            &self.aspects,
            &mut self.session,
            &mut buffer,
            &mut report,
        );
        apply_call_phase(&mut self.parser, &self.aspects, &mut buffer, &mut report);
        apply_execution_phase(&mut self.parser, &self.aspects, &mut buffer, &mut report);
        apply_around_phase(&mut self.parser, &self.aspects, &mut buffer, &mut report);

        Ok((buffer.text().to_string(), report))
    }

    /// Weave a set of files, isolating per-file failures
    ///
    /// An unreadable file is recorded in its report and never halts the
    /// remaining files.
    pub fn weave_files(&mut self, paths: &[PathBuf]) -> WeaveReport {
        let mut report = WeaveReport::default();

        for path in paths {
            match self.weave_file(path) {
                Ok(file_report) => report.files.push(file_report),
                Err(err) => {
                    eprintln!("weft: {}: {}", path.display(), err);
                    let mut file_report = FileReport::new(path);
                    file_report.failures.push(WeaveFailure {
                        phase: Phase::Read,
                        message: err.to_string(),
                    });
                    report.files.push(file_report);
                }
            }
        }

        report
    }

    /// Weave every Rust source file under a directory root
    ///
    /// Files are collected with walkdir and processed in sorted order for
    /// determinism.
    pub fn weave_root(&mut self, root: &Path) -> anyhow::Result<WeaveReport> {
        let files = collect_source_files(root);
        Ok(self.weave_files(&files))
    }
}

/// Collect all `.rs` files under a root, sorted for deterministic ordering
pub fn collect_source_files(root: &Path) -> Vec<PathBuf> {
    let mut source_files: Vec<PathBuf> = Vec::new();

    for entry in walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            source_files.push(path.to_path_buf());
        }
    }

    source_files.sort();
    source_files
}

/// Log a recoverable failure and record it in the file's report
fn record_failure(report: &mut FileReport, phase: Phase, message: String) {
    eprintln!("weft: {}: [{}] {}", report.file, phase, message);
    report.failures.push(WeaveFailure { phase, message });
}

/// Non-empty advice block, if declared
fn advice_block(block: &Option<String>) -> Option<&str> {
    block.as_deref().filter(|b| !b.is_empty())
}

/// Apply a planned insertion list in ascending order with drift correction
///
/// Each target line is the original match line from the phase-entry parse;
/// the running drift adds the lines inserted so far in this phase. Every
/// insertion is persisted immediately.
fn apply_insertions(
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
    phase: Phase,
    mut planned: Vec<(usize, &str)>,
) {
    planned.sort_by_key(|(line, _)| *line);

    let mut drift = 0;
    for (line, block) in planned {
        let new_text = insert_block(buffer.text(), line + drift, block);
        buffer.set_text(new_text);
        if let Err(err) = buffer.persist() {
            record_failure(report, phase, err.to_string());
        }
        drift += block_line_count(block);
        report.insertions += 1;
    }
}

/// Ensure accumulated import specs exist in the buffer exactly once
fn apply_imports(
    parser: &mut SourceParser,
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
    phase: Phase,
    specs: &[String],
) {
    if specs.is_empty() {
        return;
    }

    if let Err(err) = buffer.ensure_parsed(parser) {
        record_failure(report, phase, err.to_string());
        return;
    }
    let root = match buffer.tree() {
        Some(tree) => tree.root_node(),
        None => return,
    };

    let (new_text, added) = ensure_imports(buffer.text(), root, specs);
    if added == 0 {
        return;
    }

    buffer.set_text(new_text);
    if let Err(err) = buffer.persist() {
        record_failure(report, phase, err.to_string());
    }
    report.imports_added += added;
}

/// Global phase: anchor the first global aspect's blocks after the imports
///
/// Guarded by the session's per-file set: a file receives global advice at
/// most once, even across repeated passes, and is only marked once the
/// advice actually landed.
fn apply_global_phase(
    parser: &mut SourceParser,
    aspects: &[Aspect],
    session: &mut WeaveSession,
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
) {
    let aspect = match aspects
        .iter()
        .find(|a| a.pointcut.kind == PointcutKind::Global)
    {
        Some(a) => a,
        None => return,
    };

    if session.is_woven(buffer.path()) {
        return;
    }

    if let Err(err) = buffer.ensure_parsed(parser) {
        record_failure(report, Phase::Global, err.to_string());
        return;
    }
    let anchor = match buffer.tree() {
        Some(tree) => global_anchor_line(tree.root_node()),
        None => return,
    };

    let mut planned: Vec<(usize, &str)> = Vec::new();
    if let Some(before) = advice_block(&aspect.advice.before) {
        planned.push((anchor, before));
    }
    if let Some(after) = advice_block(&aspect.advice.after) {
        planned.push((anchor, after));
    }
    if planned.is_empty() && aspect.advice.imports.is_empty() {
        return;
    }

    apply_insertions(buffer, report, Phase::Global, planned);
    apply_imports(parser, buffer, report, Phase::Global, &aspect.advice.imports);

    session.mark_woven(buffer.path());
    report.global_applied = true;
}

/// Call phase: before/after blocks at matching call sites
fn apply_call_phase(
    parser: &mut SourceParser,
    aspects: &[Aspect],
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
) {
    let call_aspects: Vec<&Aspect> = aspects
        .iter()
        .filter(|a| a.pointcut.kind == PointcutKind::Call)
        .collect();
    if call_aspects.is_empty() {
        return;
    }

    if let Err(err) = buffer.ensure_parsed(parser) {
        record_failure(report, Phase::Call, err.to_string());
        return;
    }

    let mut planned: Vec<(usize, &str)> = Vec::new();
    let mut imports: Vec<String> = Vec::new();

    if let Some(tree) = buffer.tree() {
        let root = tree.root_node();
        for aspect in call_aspects {
            let matches = match_call_sites(root, buffer.text(), &aspect.pointcut);
            report.call_matches += matches.len();
            if matches.is_empty() {
                continue;
            }

            for m in &matches {
                if let Some(before) = advice_block(&aspect.advice.before) {
                    planned.push((m.line, before));
                }
                if let Some(after) = advice_block(&aspect.advice.after) {
                    planned.push((m.line + 1, after));
                }
            }
            imports.extend(aspect.advice.imports.iter().cloned());
        }
    }

    apply_insertions(buffer, report, Phase::Call, planned);
    apply_imports(parser, buffer, report, Phase::Call, &imports);
}

/// Execution phase: before/after blocks inside matching function bodies
///
/// Before-advice lands right after the body's opening delimiter. After-advice
/// lands immediately before the closing delimiter, except in functions with a
/// declared return type, where the target is offset backward by the block's
/// own line count so it runs before the trailing result statement.
fn apply_execution_phase(
    parser: &mut SourceParser,
    aspects: &[Aspect],
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
) {
    let execution_aspects: Vec<&Aspect> = aspects
        .iter()
        .filter(|a| a.pointcut.kind == PointcutKind::Execution)
        .collect();
    if execution_aspects.is_empty() {
        return;
    }

    if let Err(err) = buffer.ensure_parsed(parser) {
        record_failure(report, Phase::Execution, err.to_string());
        return;
    }

    let mut planned: Vec<(usize, &str)> = Vec::new();
    let mut imports: Vec<String> = Vec::new();

    if let Some(tree) = buffer.tree() {
        let root = tree.root_node();
        for aspect in execution_aspects {
            let sites = match_executions(root, buffer.text(), &aspect.pointcut);
            report.execution_matches += sites.len();
            if sites.is_empty() {
                continue;
            }

            for site in &sites {
                if let Some(before) = advice_block(&aspect.advice.before) {
                    planned.push((site.open_line + 1, before));
                }
                if let Some(after) = advice_block(&aspect.advice.after) {
                    let target = if site.has_return {
                        site.close_line.saturating_sub(block_line_count(after))
                    } else {
                        site.close_line
                    };
                    planned.push((target, after));
                }
            }
            imports.extend(aspect.advice.imports.iter().cloned());
        }
    }

    apply_insertions(buffer, report, Phase::Execution, planned);
    apply_imports(parser, buffer, report, Phase::Execution, &imports);
}

/// Around phase: structural subtree rewrites, chained aspect by aspect
///
/// This is the only phase safe to chain, because every aspect reparses the
/// freshly serialized buffer instead of patching stale positions. Splices
/// are applied in descending byte order; a splice whose result no longer
/// parses is discarded and the prior buffer retained.
fn apply_around_phase(
    parser: &mut SourceParser,
    aspects: &[Aspect],
    buffer: &mut SourceBuffer,
    report: &mut FileReport,
) {
    let mut imports: Vec<String> = Vec::new();

    for aspect in aspects.iter().filter(|a| a.pointcut.kind == PointcutKind::Around) {
        let around_text = match advice_block(&aspect.advice.around) {
            Some(t) => t,
            None => continue,
        };

        let pattern = match ExprTemplate::parse(parser, &aspect.pointcut.pattern) {
            Ok(t) => t,
            Err(err) => {
                record_failure(report, Phase::Around, err.to_string());
                continue;
            }
        };
        let replacement = match ExprTemplate::parse(parser, around_text) {
            Ok(t) => t,
            Err(err) => {
                record_failure(report, Phase::Around, err.to_string());
                continue;
            }
        };

        // Reparse from scratch: earlier phases and aspects moved the text
        buffer.invalidate();
        if let Err(err) = buffer.ensure_parsed(parser) {
            record_failure(report, Phase::Around, err.to_string());
            continue;
        }
        let rewrites = match buffer.tree() {
            Some(tree) => plan_rewrites(tree.root_node(), buffer.text(), &pattern, &replacement),
            None => continue,
        };
        if rewrites.is_empty() {
            continue;
        }

        let mut applied = 0;
        for rewrite in rewrites.iter().rev() {
            let mut candidate = buffer.text().to_string();
            candidate.replace_range(rewrite.byte_start..rewrite.byte_end, &rewrite.replacement);

            let parses_clean = parser
                .parse_lenient(&candidate)
                .map(|t| !t.root_node().has_error())
                .unwrap_or(false);
            if !parses_clean {
                let err = WeaveError::Format(format!(
                    "rewrite at line {} discarded",
                    rewrite.line
                ));
                record_failure(report, Phase::Around, err.to_string());
                continue;
            }

            buffer.set_text(candidate);
            if let Err(err) = buffer.persist() {
                record_failure(report, Phase::Around, err.to_string());
            }
            applied += 1;
        }

        report.around_rewrites += applied;
        if applied > 0 {
            imports.extend(aspect.advice.imports.iter().cloned());
        }
    }

    apply_imports(parser, buffer, report, Phase::Around, &imports);
}

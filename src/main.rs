//! Weft CLI - Aspect-oriented source weaver for Rust codebases
//!
//! Usage: weft <command> [arguments]

mod cli;

use anyhow::Result;
use cli::{parse_args, print_usage, Command};
use std::process::ExitCode;
use weft::report::{generate_execution_id, output_json, print_human, JsonResponse};
use weft::{load_aspects, OutputFormat, WeaveEngine};

fn main() -> ExitCode {
    let command = match parse_args() {
        Ok(command) => command,
        Err(err) => {
            eprintln!("weft: {}", err);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(command) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("weft: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Execute a parsed command; returns whether the run was failure-free
fn run(command: Command) -> Result<bool> {
    match command {
        Command::Weave {
            aspects_path,
            files,
            root,
            output_format,
        } => {
            let aspects = load_aspects(&aspects_path)?;
            let mut engine = WeaveEngine::new(aspects)?;

            let report = match root {
                Some(root) => engine.weave_root(&root)?,
                None => engine.weave_files(&files),
            };

            match output_format {
                OutputFormat::Human => print_human(&report),
                OutputFormat::Json => {
                    let execution_id = generate_execution_id();
                    output_json(&JsonResponse::new(&report, &execution_id))?;
                }
            }

            Ok(report.is_clean())
        }
        Command::Check {
            aspects_path,
            output_format,
        } => {
            let aspects = load_aspects(&aspects_path)?;

            match output_format {
                OutputFormat::Human => {
                    for aspect in &aspects {
                        println!(
                            "{:10} {}",
                            aspect.pointcut.kind.normalized_key(),
                            aspect.pointcut.pattern
                        );
                    }
                    println!("{} aspect(s) ok", aspects.len());
                }
                OutputFormat::Json => {
                    let execution_id = generate_execution_id();
                    output_json(&JsonResponse::new(&aspects, &execution_id))?;
                }
            }

            Ok(true)
        }
    }
}

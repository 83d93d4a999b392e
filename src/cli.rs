//! CLI argument parsing for weft
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use anyhow::Result;
use std::path::PathBuf;
use weft::OutputFormat;

pub fn print_usage() {
    eprintln!("Weft - Aspect-oriented source weaver for Rust codebases");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  weft <command> [arguments]");
    eprintln!("  weft --help");
    eprintln!();
    eprintln!("  weft weave --aspects <FILE> (--file <PATH>... | --root <DIR>) [--output human|json]");
    eprintln!("  weft check --aspects <FILE>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  weave     Weave declared aspects into source files");
    eprintln!("  check     Validate an aspect declaration file without weaving");
    eprintln!();
    eprintln!("Global arguments:");
    eprintln!("  --output <FORMAT>   Output format: human (default) or json");
    eprintln!();
    eprintln!("Weave arguments:");
    eprintln!("  --aspects <FILE>    JSON aspect declaration file");
    eprintln!("  --file <PATH>       Source file to weave (repeatable)");
    eprintln!("  --root <DIR>        Weave every .rs file under this directory");
    eprintln!();
    eprintln!("Check arguments:");
    eprintln!("  --aspects <FILE>    JSON aspect declaration file");
}

/// Parsed CLI command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Weave {
        aspects_path: PathBuf,
        files: Vec<PathBuf>,
        root: Option<PathBuf>,
        output_format: OutputFormat,
    },
    Check {
        aspects_path: PathBuf,
        output_format: OutputFormat,
    },
}

/// Parse command-line arguments into a Command
///
/// `--version` and `--help` print and exit; everything else either parses
/// or fails with a usage error.
pub fn parse_args() -> Result<Command> {
    parse_args_impl(std::env::args().collect(), || {
        println!("{}", weft::version::version());
    })
}

pub fn parse_args_impl<F>(args: Vec<String>, print_version: F) -> Result<Command>
where
    F: FnOnce(),
{
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    let command = &args[1];

    // Handle --version and -V flags
    if command == "--version" || command == "-V" {
        print_version();
        std::process::exit(0);
    }

    // Handle --help and -h flags
    if command == "--help" || command == "-h" {
        print_usage();
        std::process::exit(0);
    }

    match command.as_str() {
        "weave" => {
            let mut aspects_path: Option<PathBuf> = None;
            let mut files: Vec<PathBuf> = Vec::new();
            let mut root: Option<PathBuf> = None;
            let mut output_format = OutputFormat::Human;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--aspects" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--aspects requires an argument"));
                        }
                        aspects_path = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--file" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--file requires an argument"));
                        }
                        files.push(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--root" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--root requires an argument"));
                        }
                        root = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--output" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--output requires an argument"));
                        }
                        output_format = OutputFormat::from_str(&args[i + 1]).ok_or_else(|| {
                            anyhow::anyhow!("unknown output format: {}", args[i + 1])
                        })?;
                        i += 2;
                    }
                    other => {
                        return Err(anyhow::anyhow!("unknown weave argument: {}", other));
                    }
                }
            }

            let aspects_path =
                aspects_path.ok_or_else(|| anyhow::anyhow!("weave requires --aspects"))?;
            if files.is_empty() && root.is_none() {
                return Err(anyhow::anyhow!("weave requires --file or --root"));
            }
            if !files.is_empty() && root.is_some() {
                return Err(anyhow::anyhow!("--file and --root are mutually exclusive"));
            }

            Ok(Command::Weave {
                aspects_path,
                files,
                root,
                output_format,
            })
        }
        "check" => {
            let mut aspects_path: Option<PathBuf> = None;
            let mut output_format = OutputFormat::Human;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--aspects" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--aspects requires an argument"));
                        }
                        aspects_path = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--output" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--output requires an argument"));
                        }
                        output_format = OutputFormat::from_str(&args[i + 1]).ok_or_else(|| {
                            anyhow::anyhow!("unknown output format: {}", args[i + 1])
                        })?;
                        i += 2;
                    }
                    other => {
                        return Err(anyhow::anyhow!("unknown check argument: {}", other));
                    }
                }
            }

            let aspects_path =
                aspects_path.ok_or_else(|| anyhow::anyhow!("check requires --aspects"))?;
            Ok(Command::Check {
                aspects_path,
                output_format,
            })
        }
        unknown => Err(anyhow::anyhow!("unknown command: {}", unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("weft".to_string())
            .chain(list.iter().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_weave_with_files() {
        let cmd = parse_args_impl(
            args(&["weave", "--aspects", "a.json", "--file", "x.rs", "--file", "y.rs"]),
            || {},
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Weave {
                aspects_path: PathBuf::from("a.json"),
                files: vec![PathBuf::from("x.rs"), PathBuf::from("y.rs")],
                root: None,
                output_format: OutputFormat::Human,
            }
        );
    }

    #[test]
    fn test_parse_weave_with_root_and_json() {
        let cmd = parse_args_impl(
            args(&["weave", "--aspects", "a.json", "--root", "src", "--output", "json"]),
            || {},
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Weave {
                aspects_path: PathBuf::from("a.json"),
                files: Vec::new(),
                root: Some(PathBuf::from("src")),
                output_format: OutputFormat::Json,
            }
        );
    }

    #[test]
    fn test_weave_requires_target() {
        assert!(parse_args_impl(args(&["weave", "--aspects", "a.json"]), || {}).is_err());
    }

    #[test]
    fn test_file_and_root_exclusive() {
        let result = parse_args_impl(
            args(&["weave", "--aspects", "a.json", "--file", "x.rs", "--root", "src"]),
            || {},
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(parse_args_impl(args(&["unravel"]), || {}).is_err());
    }
}

//! CLI tool to inspect the syntax tree of justfiles.

use std::fs;
use std::process::ExitCode;

use justfile_cst::{Tree, formatter, parse, tokenize};

fn usage() -> ExitCode {
    eprintln!("Usage: justfile-cst <command> [--json] [files...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  parse   Print the syntax tree as an S-expression");
    eprintln!("  check   Report syntax errors");
    eprintln!("  tokens  Print the token stream");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  justfile-cst parse justfile");
    eprintln!("  justfile-cst check --json justfile");
    eprintln!("  RUST_LOG=debug justfile-cst tokens justfile");
    ExitCode::from(2)
}

fn report(path: &str, tree: &Tree) {
    for diagnostic in tree.diagnostics() {
        eprintln!(
            "{path}:{}:{}: {}: {}",
            diagnostic.position.line,
            diagnostic.position.column,
            diagnostic.code(),
            diagnostic.message()
        );
    }
}

fn print_json<T: serde::Serialize>(path: &str, value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        return usage();
    }

    let command = args[1].as_str();
    if !matches!(command, "parse" | "check" | "tokens") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }

    let json = args[2..].iter().any(|a| a == "--json");
    let files: Vec<&String> = args[2..].iter().filter(|a| *a != "--json").collect();

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match command {
            "parse" => {
                let tree = parse(&content);
                if json {
                    had_error |= !print_json(path, &tree);
                } else {
                    print!("{}", formatter::to_pretty_sexp(&tree));
                }
                report(path, &tree);
                had_error |= tree.has_errors();
            }
            "check" => {
                let tree = parse(&content);
                if json {
                    had_error |= !print_json(path, &tree.diagnostics());
                } else if tree.has_errors() {
                    report(path, &tree);
                } else {
                    eprintln!("{path}: ok");
                }
                had_error |= tree.has_errors();
            }
            _ => {
                let tokens = tokenize(&content);
                if json {
                    had_error |= !print_json(path, &tokens);
                } else {
                    for token in &tokens {
                        println!(
                            "{} {} {:?}",
                            token.kind.as_str(),
                            token.span,
                            token.text(&content)
                        );
                    }
                }
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

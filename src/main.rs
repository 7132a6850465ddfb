use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use rill::ast::printer;
use rill::error::{CompileError, RuntimeError};
use rill::interpreter::Interpreter;
use rill::interpreter::resolver::Resolver;
use rill::parser::Parser as RillParser;
use rill::repl;
use rill::scanner;

#[derive(Parser, Debug)]
#[command(name = "rill", about = "An interpreter for the Rill scripting language")]
struct Cli {
    /// Rill source file to run (omit for REPL)
    scripts: Vec<PathBuf>,

    /// Dump tokens and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST and exit
    #[arg(long)]
    dump_ast: bool,

    /// AST output format
    #[arg(long, default_value = "sexp", value_parser = ["sexp", "json"])]
    ast_format: String,
}

// Script failure exit codes, after the BSD sysexits convention.
const EXIT_COMPILE_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.scripts.len() > 1 {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        return Ok(ExitCode::SUCCESS);
    }

    let Some(path) = cli.scripts.first() else {
        if cli.dump_tokens || cli.dump_ast {
            anyhow::bail!("source file required for this operation");
        }
        repl::run_repl();
        return Ok(ExitCode::SUCCESS);
    };

    if !path.exists() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        eprintln!();
        anyhow::bail!("file not found: '{}'", path.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read source file '{}'", path.display()))?;

    if cli.dump_tokens {
        return Ok(dump_tokens(&source));
    }
    if cli.dump_ast {
        return Ok(dump_ast(&source, &cli.ast_format));
    }
    Ok(run_source(&source))
}

fn dump_tokens(source: &str) -> ExitCode {
    match scanner::scan(source) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{token}");
            }
            ExitCode::SUCCESS
        }
        Err(errors) => report_compile_errors(&errors, source),
    }
}

fn dump_ast(source: &str, format: &str) -> ExitCode {
    let tokens = match scanner::scan(source) {
        Ok(t) => t,
        Err(errors) => return report_compile_errors(&errors, source),
    };
    let program = match RillParser::new(tokens).parse() {
        Ok(p) => p,
        Err(errors) => return report_compile_errors(&errors, source),
    };
    if format == "json" {
        print!("{}", printer::to_json(&program));
    } else {
        print!("{}", printer::to_sexp(&program));
    }
    ExitCode::SUCCESS
}

fn run_source(source: &str) -> ExitCode {
    // Scan errors don't stop the pipeline: the parser still runs over what
    // was scanned, so one pass surfaces both kinds of diagnostics.
    let (tokens, mut errors) = scanner::scan_with_errors(source);
    let program = match RillParser::new(tokens).parse() {
        Ok(p) => Some(p),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            None
        }
    };
    if !errors.is_empty() {
        return report_compile_errors(&errors, source);
    }
    let program = program.expect("an error-free parse produces a program");
    let locals = match Resolver::new().resolve(&program) {
        Ok(l) => l,
        Err(errors) => return report_compile_errors(&errors, source),
    };
    let mut interpreter = Interpreter::new();
    match interpreter.interpret(&program, locals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_runtime_error(&e, source),
    }
}

fn report_compile_errors(errors: &[CompileError], source: &str) -> ExitCode {
    for error in errors {
        eprintln!("{}", error.report(source));
    }
    ExitCode::from(EXIT_COMPILE_ERROR)
}

fn report_runtime_error(error: &RuntimeError, source: &str) -> ExitCode {
    // The resolver rejects top-level returns, so the return signal cannot
    // reach here; it must still never print as a user error.
    if error.is_return() {
        eprintln!("unexpected return at top level");
    } else {
        eprintln!("{}", error.display_with_line(source));
    }
    ExitCode::from(EXIT_RUNTIME_ERROR)
}

use std::io::{self, Write};

use crate::interpreter::Interpreter;
use crate::interpreter::resolver::Resolver;
use crate::parser::Parser;
use crate::scanner;
use crate::stdlib;

/// Run the interactive REPL. The interpreter's global environment persists
/// across lines; errors report and the loop continues.
pub fn run_repl() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        stdout.flush().expect("flush stdout");

        let Some(line) = stdlib::read_line_from(&mut stdin.lock()) else {
            break; // Ctrl-D / EOF
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Auto-wrap bare expressions: if the line doesn't end with ';' or '}',
        // wrap it as `print <expr>;` so the user sees the result.
        let source = if is_bare_expression(trimmed) {
            format!("print {trimmed};")
        } else {
            trimmed.to_string()
        };

        let tokens = match scanner::scan(&source) {
            Ok(t) => t,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{}", e.report(&source));
                }
                continue;
            }
        };

        let program = match Parser::new(tokens).parse() {
            Ok(p) => p,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{}", e.report(&source));
                }
                continue;
            }
        };

        let locals = match Resolver::new().resolve(&program) {
            Ok(l) => l,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{}", e.report(&source));
                }
                continue;
            }
        };

        interpreter.merge_locals(locals);
        if let Err(e) = interpreter.interpret_additional(&program) {
            eprintln!("{}", e.display_with_line(&source));
        }
    }
}

/// Heuristic: treat the line as a bare expression if it doesn't end with
/// ';' or '}' and doesn't start with a keyword that begins a declaration
/// or statement.
fn is_bare_expression(line: &str) -> bool {
    if line.ends_with(';') || line.ends_with('}') {
        return false;
    }
    let first_word = line.split_whitespace().next().unwrap_or("");
    !matches!(
        first_word,
        "var" | "fun" | "if" | "while" | "for" | "print" | "return" | "{"
    )
}

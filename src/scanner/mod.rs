pub mod lexer;
pub mod token;

use crate::error::CompileError;
use token::Token;

/// Scan source code into a list of tokens, failing if any scan error
/// occurred.
pub fn scan(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    let (tokens, errors) = lexer::scan_all(source);
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Scan source code, returning scan errors alongside the tokens. Scan errors
/// skip the offending input rather than stopping the scan, so later stages
/// can still run and surface their own diagnostics.
pub fn scan_with_errors(source: &str) -> (Vec<Token>, Vec<CompileError>) {
    lexer::scan_all(source)
}

use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location};
use winnow::token::{any, take_till, take_while};

use crate::error::CompileError;
use crate::scanner::token::{Literal, Span, Token, TokenKind, keyword_kind};

type Input<'a> = LocatingSlice<&'a str>;

/// Promote a backtracking failure to a hard cut. Used where running out of
/// input mid-token means the token is unterminated, not "try another rule".
fn cut(_: ErrMode<ContextError>) -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

fn shebang(input: &mut Input<'_>) -> ModalResult<()> {
    ("#!", take_till(0.., '\n'), opt('\n'))
        .void()
        .parse_next(input)
}

/// Skip whitespace and `//` line comments. Block comments are handled by the
/// scan loop so an unterminated one can be reported precisely.
fn whitespace_and_comments(input: &mut Input<'_>) -> ModalResult<()> {
    loop {
        let before = input.current_token_start();
        take_while(0.., |c: char| {
            c == ' ' || c == '\t' || c == '\r' || c == '\n'
        })
        .void()
        .parse_next(input)?;

        if input.starts_with("//") {
            take_while(0.., |c: char| c != '\n')
                .void()
                .parse_next(input)?;
        } else if input.current_token_start() == before {
            break;
        }
    }
    Ok(())
}

/// `/*` comment bodies nest: every inner `/*` must be closed before the
/// outer one ends.
fn block_comment(input: &mut Input<'_>) -> ModalResult<()> {
    "/*".parse_next(input)?;
    let mut depth = 1usize;
    while depth > 0 {
        if input.starts_with("*/") {
            "*/".parse_next(input)?;
            depth -= 1;
        } else if input.starts_with("/*") {
            "/*".parse_next(input)?;
            depth += 1;
        } else {
            any.parse_next(input).map_err(cut)?;
        }
    }
    Ok(())
}

/// A string literal runs to the next unescaped `"`. Backslash sequences are
/// kept verbatim; `\` only shields the following character (so `\"` does not
/// terminate the literal). Newlines inside strings are legal.
fn string_literal(input: &mut Input<'_>) -> ModalResult<Token> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;
    let mut raw = String::new();
    loop {
        let c = any.parse_next(input).map_err(cut)?;
        match c {
            '"' => break,
            '\\' => {
                raw.push('\\');
                let shielded = any.parse_next(input).map_err(cut)?;
                raw.push(shielded);
            }
            other => raw.push(other),
        }
    }
    let end = input.current_token_start();
    let mut lexeme = String::with_capacity(raw.len() + 2);
    lexeme.push('"');
    lexeme.push_str(&raw);
    lexeme.push('"');
    Ok(Token::new(
        TokenKind::String,
        lexeme,
        Some(Literal::Str(raw)),
        Span::new(start, end - start),
    ))
}

fn number_literal(input: &mut Input<'_>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let whole: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut lexeme = whole.to_string();

    // A '.' only belongs to the number when digits follow it; `42.foo`
    // scans as NUMBER DOT IDENTIFIER.
    let checkpoint = input.checkpoint();
    let dot_result: Result<char, ErrMode<ContextError>> = '.'.parse_next(input);
    if dot_result.is_ok() {
        match take_while::<_, _, ContextError>(1.., |c: char| c.is_ascii_digit()).parse_next(input)
        {
            Ok(frac) => {
                lexeme.push('.');
                lexeme.push_str(frac);
            }
            Err(_) => {
                input.reset(&checkpoint);
            }
        }
    }

    let end = input.current_token_start();
    let value: f64 = lexeme.parse().expect("digit runs always parse as f64");
    Ok(Token::new(
        TokenKind::Number,
        lexeme,
        Some(Literal::Number(value)),
        Span::new(start, end - start),
    ))
}

fn identifier_or_keyword(input: &mut Input<'_>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let first: char = any
        .verify(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .parse_next(input)?;
    let rest: &str =
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)?;
    let end = input.current_token_start();
    let mut lexeme = String::with_capacity(1 + rest.len());
    lexeme.push(first);
    lexeme.push_str(rest);
    let kind = keyword_kind(&lexeme).unwrap_or(TokenKind::Identifier);
    Ok(Token::new(kind, lexeme, None, Span::new(start, end - start)))
}

fn two_char_token(input: &mut Input<'_>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let (kind, lexeme) = alt((
        "!=".value((TokenKind::BangEqual, "!=")),
        "==".value((TokenKind::EqualEqual, "==")),
        ">=".value((TokenKind::GreaterEqual, ">=")),
        "<=".value((TokenKind::LessEqual, "<=")),
    ))
    .parse_next(input)?;
    Ok(Token::new(kind, lexeme, None, Span::new(start, 2)))
}

fn single_char_token(input: &mut Input<'_>) -> ModalResult<Token> {
    let start = input.current_token_start();
    let c = any
        .verify(|c: &char| "(){}.,;-+/*!=<>".contains(*c))
        .parse_next(input)?;
    let kind = match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '-' => TokenKind::Minus,
        '+' => TokenKind::Plus,
        ';' => TokenKind::Semicolon,
        '/' => TokenKind::Slash,
        '*' => TokenKind::Star,
        '!' => TokenKind::Bang,
        '=' => TokenKind::Equal,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        _ => unreachable!("verify guarantees valid char"),
    };
    Ok(Token::new(kind, c.to_string(), None, Span::new(start, 1)))
}

fn scan_token(input: &mut Input<'_>) -> ModalResult<Token> {
    alt((
        number_literal,
        identifier_or_keyword,
        two_char_token,
        single_char_token,
    ))
    .parse_next(input)
}

/// Scan all tokens from source. The token list is always terminated by EOF;
/// errors accumulate alongside it so later pipeline stages can still run
/// over what was scanned.
pub fn scan_all(source: &str) -> (Vec<Token>, Vec<CompileError>) {
    let mut input = LocatingSlice::new(source);
    let _ = opt(shebang).parse_next(&mut input);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        if whitespace_and_comments(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            break;
        }
        if input.starts_with("/*") {
            let start = input.current_token_start();
            if block_comment(&mut input).is_err() {
                errors.push(CompileError::scan("Unterminated block comment", start, 2));
                break;
            }
            continue;
        }
        if input.starts_with("\"") {
            let start = input.current_token_start();
            match string_literal(&mut input) {
                Ok(token) => tokens.push(token),
                Err(_) => {
                    errors.push(CompileError::scan(
                        "Unterminated string",
                        start,
                        source.len() - start,
                    ));
                    break;
                }
            }
            continue;
        }
        match scan_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                let offset = input.current_token_start();
                let c = any::<_, ContextError>.parse_next(&mut input).ok();
                let ch = c.unwrap_or('?');
                errors.push(CompileError::scan(
                    format!("Unexpected character '{ch}'"),
                    offset,
                    ch.len_utf8(),
                ));
            }
        }
    }

    tokens.push(Token::new(
        TokenKind::Eof,
        "",
        None,
        Span::new(source.len(), 0),
    ));

    (tokens, errors)
}

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::scanner::token::Span;

// ============= Compile-time errors (scan / parse / resolve) =============

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("scan error: {message}")]
    #[diagnostic(code(rill::scan))]
    Scan {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("parse error: {message}")]
    #[diagnostic(code(rill::parse))]
    Parse {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("resolution error: {message}")]
    #[diagnostic(code(rill::resolve))]
    Resolve {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },
}

impl CompileError {
    pub fn scan(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Scan {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
        }
    }

    pub fn parse(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Parse {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
        }
    }

    pub fn resolve(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Resolve {
            message: message.into(),
            span: SourceSpan::new(offset.into(), len),
        }
    }

    fn message_and_span(&self) -> (&str, &SourceSpan) {
        match self {
            Self::Scan { message, span }
            | Self::Parse { message, span }
            | Self::Resolve { message, span } => (message, span),
        }
    }

    /// Render in the driver's diagnostic format: `[line N] Error <where>: <msg>`.
    /// Scan errors carry no location phrase; parse and resolution errors name
    /// the offending lexeme, or "at end" when the input ran out.
    pub fn report(&self, source: &str) -> String {
        let (message, span) = self.message_and_span();
        let offset = span.offset();
        let line = offset_to_line(source, offset);
        match self {
            Self::Scan { .. } => format!("[line {line}] Error: {message}"),
            Self::Parse { .. } | Self::Resolve { .. } => {
                if offset >= source.len() {
                    format!("[line {line}] Error at end: {message}")
                } else {
                    let end = (offset + span.len().max(1)).min(source.len());
                    let lexeme = &source[offset..end];
                    format!("[line {line}] Error at '{lexeme}': {message}")
                }
            }
        }
    }
}

// ============= Runtime errors and the return signal =============

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{message}")]
    Error { message: String, span: Option<Span> },

    /// Not an error: the unwinding carrier for `return`. Caught by pattern
    /// match at the innermost call boundary and nowhere else.
    #[error("return")]
    Return {
        value: crate::interpreter::value::Value,
    },
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self::Error {
            message: message.into(),
            span: Some(span),
        }
    }

    /// Render in the driver's diagnostic format: the message, then the line
    /// marker on its own line.
    pub fn display_with_line(&self, source: &str) -> String {
        match self {
            Self::Error {
                message,
                span: Some(span),
            } => {
                let line = offset_to_line(source, span.offset);
                format!("{message}\n[line {line}]")
            }
            Self::Error {
                message,
                span: None,
            } => message.clone(),
            Self::Return { .. } => "unexpected return".to_string(),
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return { .. })
    }

    pub fn into_return_value(self) -> Option<crate::interpreter::value::Value> {
        match self {
            Self::Return { value } => Some(value),
            _ => None,
        }
    }
}

/// Calculate the 1-based line number of a byte offset in source.
fn offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .chars()
        .filter(|&c| c == '\n')
        .count()
        + 1
}

// ============= Tests =============

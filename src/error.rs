use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::scanner::token::Span;

// ============= Compile-time errors (with miette diagnostics) =============

/// An error reported while scanning or compiling source text.
///
/// The `Display` form is the canonical diagnostic line written to stderr;
/// the miette derive adds a labeled span for tooling.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("[line {line}] Error: {message}")]
    #[diagnostic(code(lox::scan))]
    Scan {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("[line {line}] Error at '{lexeme}': {message}")]
    #[diagnostic(code(lox::parse))]
    Parse {
        message: String,
        lexeme: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("[line {line}] Error at end: {message}")]
    #[diagnostic(code(lox::parse))]
    ParseAtEnd {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },
}

impl CompileError {
    pub fn scan(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::Scan {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn parse(
        message: impl Into<String>,
        lexeme: impl Into<String>,
        line: usize,
        span: Span,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            lexeme: lexeme.into(),
            line,
            span: span.into(),
        }
    }

    pub fn at_end(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::ParseAtEnd {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Scan { line, .. } | Self::Parse { line, .. } | Self::ParseAtEnd { line, .. } => {
                *line
            }
        }
    }
}

// ============= Runtime errors =============

/// An error raised by the VM while executing a chunk.
///
/// Display is the two-line report: the message, then the source line of the
/// instruction that raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}\n[line {line}] in script")]
pub struct RuntimeError {
    message: String,
    line: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

// ============= Combined interpret errors =============

/// Either failure mode of a compile-and-run pass. Compile and runtime
/// failures keep their own diagnostic shapes; this enum never mixes them.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("{}", join_diagnostics(.0))]
    Compile(Vec<CompileError>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<Vec<CompileError>> for InterpretError {
    fn from(errors: Vec<CompileError>) -> Self {
        Self::Compile(errors)
    }
}

fn join_diagnostics(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ============= Tests =============

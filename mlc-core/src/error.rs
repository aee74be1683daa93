//! Error types for the compiler library.
//!
//! `CompilerError` separates diagnostics about the user's program (lexical
//! errors) from internal invariant faults, which indicate a defect in an
//! earlier compiler stage and must never be reported as a problem with the
//! program being compiled.

use thiserror::Error;

use crate::lexer::LexError;
use crate::span::Span;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("internal compiler error: {0}")]
    Internal(#[from] InvariantFault),
}

impl CompilerError {
    /// True for faults caused by the compiler itself rather than by the input program.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompilerError::Internal(_))
    }
}

/// A broken invariant between compiler stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantFault {
    /// Function literals are lifted to the top-level table by closure
    /// extraction, so none may remain inside a block.
    #[error("function literal `{ident}` at {span} was left inside {}", describe_owner(.owner))]
    FunctionInBlock {
        ident: String,
        owner: Option<String>,
        span: Span,
    },
}

fn describe_owner(owner: &Option<String>) -> String {
    match owner {
        Some(name) => format!("the body of `{}`", name),
        None => "the entry block".to_string(),
    }
}

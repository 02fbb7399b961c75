//! Crate-level errors (wraps the per-pattern errors)

use thiserror::Error;

use crate::patterns::atm::AtmError;
use crate::patterns::integer::{EvalError, SyntaxError};

/// Top-level error type, the one the binary reports to the user.
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("{0}")]
    Atm(#[from] AtmError),

    #[error("{0}")]
    Eval(#[from] EvalError),

    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

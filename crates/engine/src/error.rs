//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when a typed value is not a decimal amount.
//! - [`InsufficientHistory`] thrown when the event log is shorter than the
//!   window a caller needs.
//! - [`UnclassifiableEvent`] thrown when a delivery is neither a button press
//!   nor a message.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientHistory`]: EngineError::InsufficientHistory
//!  [`UnclassifiableEvent`]: EngineError::UnclassifiableEvent
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient history: needed {needed} events, found {found}")]
    InsufficientHistory { needed: usize, found: usize },
    #[error("Unclassifiable event: {0}")]
    UnclassifiableEvent(String),
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (
                Self::InsufficientHistory {
                    needed: a,
                    found: b,
                },
                Self::InsufficientHistory {
                    needed: c,
                    found: d,
                },
            ) => a == c && b == d,
            (Self::UnclassifiableEvent(a), Self::UnclassifiableEvent(b)) => a == b,
            (Self::MalformedEvent(a), Self::MalformedEvent(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

//! The module contains the errors the engine can raise.
//!
//! Every variant maps to exactly one HTTP status at the server boundary:
//!
//! - [`Validation`] → 400
//! - [`NotFound`] → 404
//! - [`Conflict`] → 409
//! - [`Database`] → 500
//!
//! [`Validation`]: EngineError::Validation
//! [`NotFound`]: EngineError::NotFound
//! [`Conflict`]: EngineError::Conflict
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or out-of-range input that reached the engine.
    #[error("{0}")]
    Validation(String),
    /// The requested row is absent or not owned by the caller.
    #[error("{0}")]
    NotFound(String),
    /// The mutation conflicts with current state (closed invoice, duplicate).
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

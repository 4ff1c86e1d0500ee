//! Error types for the order book.

use thiserror::Error;

/// A breached `add` precondition.
///
/// Inputs are validated upstream, so any of these reaching the book means
/// the engine's invariants can no longer be trusted; the caller is
/// expected to treat them as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("duplicate order id: {0}")]
    DuplicateId(String),

    #[error("order price must be positive")]
    BadPrice,

    #[error("order size must be positive")]
    BadSize,
}

/// Why a cancel was refused. Returned, never emitted as an event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CancelError {
    #[error("order not found")]
    NotFound,

    #[error("not owner")]
    NotOwner,
}

impl CancelError {
    /// Reject reason string carried in the `cancel_reject` reply.
    pub fn reject_reason(&self) -> &'static str {
        match self {
            CancelError::NotFound => "not found",
            CancelError::NotOwner => "not owner",
        }
    }
}

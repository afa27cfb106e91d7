//! Domain error types.

use thiserror::Error;

use crate::cart::CartError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No account exists with the given id.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// A cart invariant rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// No address exists with the given id.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// The account gateway could not be reached.
    #[error("Account gateway unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    /// Returns the stable reason code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::AccountNotFound(_) => "NO_ACCOUNT_FOUND",
            DomainError::Cart(err) => err.code(),
            DomainError::AddressNotFound(_) => "ADDRESS_NOT_FOUND",
            DomainError::Unavailable(_) => "SERVER_ERROR",
        }
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;

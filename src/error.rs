use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Error taxonomy for the ledger core.
///
/// Every variant carries a stable machine-readable code (see [`PaymentError::code`])
/// so callers can branch without matching on the human message.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Duplicate idempotency key: {0}")]
    DuplicateIdempotencyKey(String),
    #[error("Illegal state transition: {0}")]
    State(String),
    #[error("Insufficient funds for merchant {0}")]
    InsufficientFunds(uuid::Uuid),
    #[error("Merchant account {0} is suspended")]
    AccountSuspended(uuid::Uuid),
    #[error("Concurrent modification: {0}")]
    Concurrency(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Stable machine code for each error kind. These never change once published.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_ERROR",
            PaymentError::InvalidCurrency(_) => "INVALID_CURRENCY",
            PaymentError::NotFound(_) => "NOT_FOUND",
            PaymentError::Conflict(_) => "CONFLICT",
            PaymentError::DuplicateIdempotencyKey(_) => "DUPLICATE_IDEMPOTENCY_KEY",
            PaymentError::State(_) => "ILLEGAL_STATE",
            PaymentError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            PaymentError::AccountSuspended(_) => "ACCOUNT_SUSPENDED",
            PaymentError::Concurrency(_) => "CONCURRENT_MODIFICATION",
            PaymentError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            PaymentError::Validation("bad".into()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            PaymentError::InsufficientFunds(uuid::Uuid::nil()).code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            PaymentError::Concurrency("lost race".into()).code(),
            "CONCURRENT_MODIFICATION"
        );
    }
}

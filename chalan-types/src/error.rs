//! Error types for the chalan service.

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Overpayment: remaining {remaining}, requested {requested}")]
    Overpayment { remaining: i64, requested: i64 },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    /// Deliberately ambiguous: a missing voucher and an already-paid
    /// voucher are indistinguishable to the caller, so client retries
    /// of a payment are idempotent.
    #[error("Voucher not found or already paid")]
    NotFoundOrAlreadyPaid,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for caller-facing responses).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Voucher not found or already paid")]
    NotFoundOrAlreadyPaid,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::Overpayment {
                remaining,
                requested,
            }) => AppError::Conflict(format!(
                "payment of {} exceeds remaining balance {}",
                requested, remaining
            )),
            RepoError::Domain(DomainError::ValidationError(msg)) => AppError::BadRequest(msg),
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::NotFoundOrAlreadyPaid => AppError::NotFoundOrAlreadyPaid,
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}

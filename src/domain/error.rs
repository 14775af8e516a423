//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule and invariant failures of the marketplace core.
///
/// These errors are independent of the web/infrastructure layer; the
/// application error type maps them to HTTP statuses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// User account not found (or the account is not a user)
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Company account not found (or the account is not a company)
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Offer not found
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Offer is not owned by the caller
    #[error("Offer access denied")]
    OfferAccessDenied,

    /// Transaction is not owned by the caller
    #[error("Transaction access denied")]
    TransactionAccessDenied,

    /// Company must be activated before it can act
    #[error("Company is not active")]
    CompanyNotActive,

    /// Company activation requested twice
    #[error("Company is already active")]
    CompanyAlreadyActive,

    /// Category name already taken
    #[error("Category already exists: {0}")]
    CategoryAlreadyExists(String),

    /// Offer has been archived and can no longer be purchased
    #[error("Offer has expired")]
    OfferExpired,

    /// Refund requested after the refund window closed
    #[error("Refund window has expired")]
    RefundWindowExpired,

    /// Offer deletion requested after the grace window closed
    #[error("Offer deletion window has expired")]
    OfferDeletionWindowExpired,

    /// Balance does not cover the withdrawal
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Offer stock does not cover the purchase
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Invalid amount (zero, negative, or malformed)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Payment does not equal price * count
    #[error("Paid amount mismatch: expected {expected}, got {paid}")]
    PaidMismatch { expected: Decimal, paid: Decimal },

    /// Balance delta after a deposit did not match the deposited amount
    #[error("Deposit inconsistency: expected delta {expected}, observed {observed}")]
    DepositInconsistency {
        expected: Decimal,
        observed: Decimal,
    },

    /// Balance delta after a withdrawal did not match the withdrawn amount
    #[error("Withdraw inconsistency: expected delta {expected}, observed {observed}")]
    WithdrawInconsistency {
        expected: Decimal,
        observed: Decimal,
    },

    /// Stock delta after a mutation did not match the requested count
    #[error("Stock inconsistency: expected delta {expected}, observed {observed}")]
    StockInconsistency { expected: i64, observed: i64 },

    /// Persisting the transaction row failed
    #[error("Transaction creation failed")]
    TransactionCreationFailed,

    /// Deleting refunded transaction rows failed
    #[error("Refund failed")]
    RefundFailed,

    /// Persisting the offer failed
    #[error("Offer creation failed")]
    OfferCreationFailed,

    /// Deleting the offer row failed
    #[error("Offer deletion failed")]
    OfferDeletionFailed,
}

impl DomainError {
    /// Check if this is a client error (the caller's request is at fault)
    pub fn is_client_error(&self) -> bool {
        !self.is_inconsistency() && !self.is_persistence_failure()
    }

    /// Check if this is a post-mutation delta mismatch.
    ///
    /// These indicate a persistence-layer defect or a lost update and are
    /// surfaced as server errors; the core never retries them.
    pub fn is_inconsistency(&self) -> bool {
        matches!(
            self,
            Self::DepositInconsistency { .. }
                | Self::WithdrawInconsistency { .. }
                | Self::StockInconsistency { .. }
        )
    }

    /// Check if this is an unexplained persistence failure
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::TransactionCreationFailed
                | Self::RefundFailed
                | Self::OfferCreationFailed
                | Self::OfferDeletionFailed
        )
    }
}

//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid auth token")]
    InvalidAuthToken,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // Business-rule errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::MissingHeader(header) => {
                (StatusCode::BAD_REQUEST, "missing_header", Some(header.clone()))
            }

            // 401 Unauthorized
            AppError::InvalidAuthToken => {
                (StatusCode::UNAUTHORIZED, "invalid_auth_token", None)
            }

            // 403 Forbidden
            AppError::PermissionDenied => {
                (StatusCode::FORBIDDEN, "permission_denied", None)
            }

            // 404 Not Found
            AppError::AccountNotFound(id) => {
                (StatusCode::NOT_FOUND, "account_not_found", Some(id.clone()))
            }

            // Business-rule errors - map to appropriate HTTP status
            AppError::Domain(ref domain_err) => match domain_err {
                DomainError::UserNotFound(id) => {
                    (StatusCode::NOT_FOUND, "user_not_found", Some(id.clone()))
                }
                DomainError::CompanyNotFound(id) => {
                    (StatusCode::NOT_FOUND, "company_not_found", Some(id.clone()))
                }
                DomainError::CategoryNotFound(id) => {
                    (StatusCode::NOT_FOUND, "category_not_found", Some(id.clone()))
                }
                DomainError::OfferNotFound(id) => {
                    (StatusCode::NOT_FOUND, "offer_not_found", Some(id.clone()))
                }
                DomainError::TransactionNotFound(id) => {
                    (StatusCode::NOT_FOUND, "transaction_not_found", Some(id.clone()))
                }
                DomainError::OfferAccessDenied => {
                    (StatusCode::FORBIDDEN, "offer_access_denied", None)
                }
                DomainError::TransactionAccessDenied => {
                    (StatusCode::FORBIDDEN, "transaction_access_denied", None)
                }
                DomainError::CompanyNotActive => {
                    (StatusCode::CONFLICT, "company_not_active", None)
                }
                DomainError::CompanyAlreadyActive => {
                    (StatusCode::CONFLICT, "company_already_active", None)
                }
                DomainError::CategoryAlreadyExists(name) => {
                    (StatusCode::CONFLICT, "category_already_exists", Some(name.clone()))
                }
                DomainError::OfferExpired => {
                    (StatusCode::CONFLICT, "offer_expired", None)
                }
                DomainError::RefundWindowExpired => {
                    (StatusCode::CONFLICT, "refund_window_expired", None)
                }
                DomainError::OfferDeletionWindowExpired => {
                    (StatusCode::CONFLICT, "offer_deletion_window_expired", None)
                }
                DomainError::InsufficientFunds { .. } => {
                    (StatusCode::CONFLICT, "insufficient_funds", Some(domain_err.to_string()))
                }
                DomainError::InsufficientStock { .. } => {
                    (StatusCode::CONFLICT, "insufficient_stock", Some(domain_err.to_string()))
                }
                DomainError::InvalidAmount(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                }
                DomainError::PaidMismatch { .. } => {
                    (StatusCode::BAD_REQUEST, "paid_mismatch", Some(domain_err.to_string()))
                }
                DomainError::DepositInconsistency { .. }
                | DomainError::WithdrawInconsistency { .. }
                | DomainError::StockInconsistency { .. } => {
                    tracing::error!(error = %domain_err, "Post-mutation delta mismatch");
                    (StatusCode::INTERNAL_SERVER_ERROR, "inconsistency", Some(domain_err.to_string()))
                }
                DomainError::TransactionCreationFailed
                | DomainError::RefundFailed
                | DomainError::OfferCreationFailed
                | DomainError::OfferDeletionFailed => {
                    tracing::error!(error = %domain_err, "Persistence failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure", Some(domain_err.to_string()))
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::OfferNotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::TransactionNotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_access_denied_maps_to_403() {
        assert_eq!(
            status_of(DomainError::OfferAccessDenied.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::TransactionAccessDenied.into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_business_conflicts_map_to_409() {
        assert_eq!(
            status_of(DomainError::OfferExpired.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::RefundWindowExpired.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::InsufficientFunds {
                    required: rust_decimal::Decimal::new(100, 0),
                    available: rust_decimal::Decimal::new(50, 0),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_inconsistency_maps_to_500() {
        assert_eq!(
            status_of(
                DomainError::StockInconsistency {
                    expected: 3,
                    observed: 2,
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_paid_mismatch_maps_to_400() {
        assert_eq!(
            status_of(
                DomainError::PaidMismatch {
                    expected: rust_decimal::Decimal::new(150, 0),
                    paid: rust_decimal::Decimal::new(14999, 2),
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
    }
}

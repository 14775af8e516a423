//! Purchase entity
//!
//! A row in the transaction ledger: how many units of which offer a user
//! bought, and exactly what they paid. `paid` is fixed at creation and is the
//! amount returned on refund, regardless of later price changes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, DomainError};

/// Minutes after creation during which the buyer may self-refund.
pub const REFUND_WINDOW_MINUTES: i64 = 5;

/// A completed purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    /// Units purchased, strictly positive
    pub count: i32,
    /// Total paid at creation; refunded verbatim
    pub paid: Amount,
    pub created_at: DateTime<Utc>,
    /// Buyer account
    pub user_id: Uuid,
    pub offer_id: Uuid,
}

impl Purchase {
    /// Check that `paid` equals `price * count`.
    ///
    /// The expected total is computed from the offer's current price at
    /// purchase time; any deviation is rejected.
    pub fn verify_paid(price: &Amount, count: u32, paid: &Amount) -> Result<(), DomainError> {
        let expected = price
            .times_units(count)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        if *paid != expected {
            return Err(DomainError::PaidMismatch {
                expected: expected.value(),
                paid: paid.value(),
            });
        }

        Ok(())
    }

    /// Whether the buyer may still refund this purchase at `now`
    pub fn refund_window_open(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::minutes(REFUND_WINDOW_MINUTES)
    }
}

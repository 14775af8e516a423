//! Offer entity
//!
//! A listing published by an active company: remaining stock, a unit price,
//! and a scheduled archival cutoff. Stock only moves through the stock
//! manager; archival is a one-way flag flipped by the background sweep.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Amount;

/// Minutes after creation during which the owner may hard-delete the offer.
pub const DELETION_GRACE_MINUTES: i64 = 10;

/// A published offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Remaining stock, never negative
    pub count: i32,
    /// Unit price, strictly positive
    pub price: Amount,
    pub created_at: DateTime<Utc>,
    /// Scheduled archival cutoff; the sweep flips `is_archived` once passed
    pub archive_at: DateTime<Utc>,
    pub is_archived: bool,
    /// Owning company account
    pub account_id: Uuid,
    pub category_id: Uuid,
}

impl Offer {
    /// Whether the offer can still be purchased
    pub fn is_purchasable(&self) -> bool {
        !self.is_archived
    }

    /// Whether the owner may still hard-delete this offer at `now`
    pub fn deletion_window_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.created_at + Duration::minutes(DELETION_GRACE_MINUTES)
    }

    /// Whether the archival cutoff has passed at `now`
    pub fn archive_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_archived && self.archive_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_offer(created_at: DateTime<Utc>) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            name: "Sample".into(),
            description: None,
            count: 5,
            price: Amount::new(dec!(50)).unwrap(),
            created_at,
            archive_at: created_at + Duration::days(7),
            is_archived: false,
            account_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_archived_offer_not_purchasable() {
        let mut offer = sample_offer(Utc::now());
        assert!(offer.is_purchasable());

        offer.is_archived = true;
        assert!(!offer.is_purchasable());
    }

    #[test]
    fn test_deletion_window() {
        let created = Utc::now();
        let offer = sample_offer(created);

        assert!(offer.deletion_window_open(created + Duration::minutes(9)));
        assert!(offer.deletion_window_open(created + Duration::minutes(10)));
        assert!(!offer.deletion_window_open(created + Duration::minutes(11)));
    }

    #[test]
    fn test_archive_due() {
        let created = Utc::now();
        let mut offer = sample_offer(created);

        assert!(!offer.archive_due(created + Duration::days(6)));
        assert!(offer.archive_due(created + Duration::days(8)));

        // Already-archived offers are never due again
        offer.is_archived = true;
        assert!(!offer.archive_due(created + Duration::days(8)));
    }
}

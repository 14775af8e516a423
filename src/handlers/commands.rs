//! Command definitions
//!
//! Commands represent intentions to change the system state. The acting
//! account always comes from the authenticated request context, never from
//! the command itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to purchase units of an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCommand {
    /// Offer being purchased
    pub offer_id: Uuid,
    /// Units to purchase
    pub count: i32,
    /// Total the buyer expects to pay; must equal price * count
    pub paid: Decimal,
}

impl PurchaseCommand {
    pub fn new(offer_id: Uuid, count: i32, paid: Decimal) -> Self {
        Self {
            offer_id,
            count,
            paid,
        }
    }
}

/// Command to refund a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundCommand {
    pub transaction_id: Uuid,
}

impl RefundCommand {
    pub fn new(transaction_id: Uuid) -> Self {
        Self { transaction_id }
    }
}

/// Command to publish a new offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferCommand {
    pub name: String,
    pub description: Option<String>,
    /// Initial stock
    pub count: i32,
    /// Unit price
    pub price: Decimal,
    /// Scheduled archival cutoff; must be in the future
    pub archive_at: DateTime<Utc>,
    pub category_id: Uuid,
}

impl CreateOfferCommand {
    pub fn new(
        name: String,
        count: i32,
        price: Decimal,
        archive_at: DateTime<Utc>,
        category_id: Uuid,
    ) -> Self {
        Self {
            name,
            description: None,
            count,
            price,
            archive_at,
            category_id,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

/// Command to hard-delete an offer (refunding all its purchases)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOfferCommand {
    pub offer_id: Uuid,
}

impl DeleteOfferCommand {
    pub fn new(offer_id: Uuid) -> Self {
        Self { offer_id }
    }
}

/// Command to create a category (admin only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub description: Option<String>,
}

impl CreateCategoryCommand {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: None,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

/// Command to activate a company account (admin only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateCompanyCommand {
    pub company_id: Uuid,
}

impl ActivateCompanyCommand {
    pub fn new(company_id: Uuid) -> Self {
        Self { company_id }
    }
}

/// Result of a successful purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub transaction_id: Uuid,
    pub offer_id: Uuid,
    pub count: i32,
    pub paid: Decimal,
    /// Buyer balance after the withdrawal
    pub balance: Decimal,
}

/// Result of a successful refund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    pub transaction_id: Uuid,
    pub refunded: Decimal,
    /// Buyer balance after the deposit
    pub balance: Decimal,
}

/// Result of a successful offer deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOfferResult {
    pub offer_id: Uuid,
    /// Purchases refunded in the same unit of work
    pub transactions_refunded: u64,
}

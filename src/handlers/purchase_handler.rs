//! Purchase Handler
//!
//! Creates a transaction: withdraws the payment from the buyer, decreases the
//! offer's stock, and persists the transaction row, all inside one unit of
//! work. Any failure after the transaction begins rolls everything back.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::{Amount, DomainError, RequestContext};
use crate::error::AppError;
use crate::ledger::AccountLedger;
use crate::model::Purchase;
use crate::repository::{AccountRepository, OfferRepository, TransactionRepository};
use crate::stock::StockManager;

use super::{PurchaseCommand, PurchaseResult};

/// Handler for purchase creation
pub struct PurchaseHandler {
    accounts: AccountRepository,
    offers: OfferRepository,
    transactions: TransactionRepository,
    ledger: AccountLedger,
    stock: StockManager,
    audit: AuditLogService,
    pool: PgPool,
}

impl PurchaseHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            offers: OfferRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            ledger: AccountLedger::new(),
            stock: StockManager::new(pool.clone()),
            audit: AuditLogService::new(pool.clone()),
            pool,
        }
    }

    /// Execute the purchase command for the authenticated buyer.
    pub async fn execute(
        &self,
        command: PurchaseCommand,
        context: &RequestContext,
    ) -> Result<PurchaseResult, AppError> {
        if command.count <= 0 {
            return Err(DomainError::InvalidAmount(format!(
                "purchase count must be positive (got {})",
                command.count
            ))
            .into());
        }

        // Populate: buyer and offer must both resolve
        let buyer = self
            .accounts
            .find(context.account_id)
            .await?
            .filter(|a| a.user_balance().is_some())
            .ok_or_else(|| DomainError::UserNotFound(context.account_id.to_string()))?;

        let offer = self
            .offers
            .find(command.offer_id)
            .await?
            .ok_or_else(|| DomainError::OfferNotFound(command.offer_id.to_string()))?;

        // Validate: exact payment, offer still purchasable
        let paid = Amount::new(command.paid)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;
        Purchase::verify_paid(&offer.price, command.count as u32, &paid)?;

        if !offer.is_purchasable() {
            return Err(DomainError::OfferExpired.into());
        }

        let purchase = Purchase {
            id: Uuid::new_v4(),
            count: command.count,
            paid,
            created_at: Utc::now(),
            user_id: buyer.id,
            offer_id: offer.id,
        };

        // One unit of work: withdraw, then decrease stock, then persist the
        // row. An error on any step drops the transaction, which rolls back.
        let mut tx = self.pool.begin().await?;

        let balance = self
            .ledger
            .withdraw(&mut tx, buyer.id, paid.value())
            .await?;

        self.stock.decrease(&mut tx, offer.id, command.count).await?;

        self.transactions.insert(&mut tx, &purchase).await?;

        self.audit
            .log_in(
                &mut tx,
                AuditRecord::new(AuditAction::PurchaseCreated)
                    .resource_id(purchase.id)
                    .detail(&serde_json::json!({
                        "offer_id": offer.id,
                        "count": purchase.count,
                        "paid": purchase.paid.value(),
                    })),
                context,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %purchase.id,
            offer_id = %offer.id,
            user_id = %buyer.id,
            count = purchase.count,
            paid = %purchase.paid,
            "Purchase completed"
        );

        Ok(PurchaseResult {
            transaction_id: purchase.id,
            offer_id: offer.id,
            count: purchase.count,
            paid: purchase.paid.value(),
            balance: balance.value(),
        })
    }
}

//! Refund Handler
//!
//! Reverses purchases. A single refund is buyer-initiated and time-boxed; the
//! bulk variant runs inside an offer deletion's unit of work and refunds every
//! purchase of the offer.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::{DomainError, RequestContext};
use crate::error::AppError;
use crate::ledger::AccountLedger;
use crate::repository::TransactionRepository;
use crate::stock::StockManager;

use super::{RefundCommand, RefundResult};

/// Handler for purchase refunds
pub struct RefundHandler {
    transactions: TransactionRepository,
    ledger: AccountLedger,
    stock: StockManager,
    audit: AuditLogService,
    pool: PgPool,
}

impl RefundHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionRepository::new(pool.clone()),
            ledger: AccountLedger::new(),
            stock: StockManager::new(pool.clone()),
            audit: AuditLogService::new(pool.clone()),
            pool,
        }
    }

    /// Refund one purchase for the buyer who made it.
    ///
    /// Returns the stock to the offer, deposits the exact `paid` amount back,
    /// and removes the transaction row, all inside one unit of work.
    pub async fn execute(
        &self,
        command: RefundCommand,
        context: &RequestContext,
    ) -> Result<RefundResult, AppError> {
        let purchase = self
            .transactions
            .find(command.transaction_id)
            .await?
            .ok_or_else(|| DomainError::TransactionNotFound(command.transaction_id.to_string()))?;

        if purchase.user_id != context.account_id {
            return Err(DomainError::TransactionAccessDenied.into());
        }

        if !purchase.refund_window_open(Utc::now()) {
            return Err(DomainError::RefundWindowExpired.into());
        }

        let mut tx = self.pool.begin().await?;

        self.stock
            .increase(&mut tx, purchase.offer_id, purchase.count)
            .await?;

        let balance = self
            .ledger
            .deposit(&mut tx, purchase.user_id, purchase.paid.value())
            .await?;

        let deleted = self.transactions.delete(&mut tx, purchase.id).await?;
        if deleted != 1 {
            return Err(DomainError::RefundFailed.into());
        }

        self.audit
            .log_in(
                &mut tx,
                AuditRecord::new(AuditAction::PurchaseRefunded)
                    .resource_id(purchase.id)
                    .detail(&serde_json::json!({
                        "offer_id": purchase.offer_id,
                        "count": purchase.count,
                        "refunded": purchase.paid.value(),
                    })),
                context,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %purchase.id,
            offer_id = %purchase.offer_id,
            refunded = %purchase.paid,
            "Purchase refunded"
        );

        Ok(RefundResult {
            transaction_id: purchase.id,
            refunded: purchase.paid.value(),
            balance: balance.value(),
        })
    }

    /// Refund every purchase of an offer inside the caller's open unit of
    /// work. Used when the offer itself is being deleted.
    ///
    /// All deposits happen before the bulk delete, so a failure anywhere
    /// leaves no partial refund behind once the caller rolls back. Returns
    /// the number of purchases refunded.
    pub async fn refund_all_by_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
    ) -> Result<u64, AppError> {
        let purchases = self.transactions.list_by_offer(tx, offer_id).await?;

        for purchase in &purchases {
            self.ledger
                .deposit(tx, purchase.user_id, purchase.paid.value())
                .await?;
        }

        let deleted = self.transactions.delete_by_offer(tx, offer_id).await?;
        if deleted != purchases.len() as u64 {
            return Err(DomainError::RefundFailed.into());
        }

        if deleted > 0 {
            tracing::info!(%offer_id, refunded = deleted, "Bulk-refunded purchases of offer");
        }

        Ok(deleted)
    }
}

//! Delete Offer Handler
//!
//! Hard-deletes an offer within its grace window. Every open purchase of the
//! offer is refunded in the same unit of work as the offer's removal, so
//! buyers and the offer row always agree.

use chrono::Utc;
use sqlx::PgPool;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::{DomainError, RequestContext};
use crate::error::AppError;
use crate::repository::{AccountRepository, OfferRepository};

use super::{require_active_company, DeleteOfferCommand, DeleteOfferResult, RefundHandler};

/// Handler for owner-initiated offer deletion
pub struct DeleteOfferHandler {
    accounts: AccountRepository,
    offers: OfferRepository,
    refunds: RefundHandler,
    audit: AuditLogService,
    pool: PgPool,
}

impl DeleteOfferHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            offers: OfferRepository::new(pool.clone()),
            refunds: RefundHandler::new(pool.clone()),
            audit: AuditLogService::new(pool.clone()),
            pool,
        }
    }

    /// Execute the delete-offer command for the authenticated company.
    pub async fn execute(
        &self,
        command: DeleteOfferCommand,
        context: &RequestContext,
    ) -> Result<DeleteOfferResult, AppError> {
        let company = require_active_company(&self.accounts, context.account_id).await?;

        let offer = self
            .offers
            .find(command.offer_id)
            .await?
            .ok_or_else(|| DomainError::OfferNotFound(command.offer_id.to_string()))?;

        if offer.account_id != company.id {
            return Err(DomainError::OfferAccessDenied.into());
        }

        if !offer.deletion_window_open(Utc::now()) {
            return Err(DomainError::OfferDeletionWindowExpired.into());
        }

        // One unit of work: refund every purchase, then remove the offer. An
        // error on any step drops the transaction, which rolls back.
        let mut tx = self.pool.begin().await?;

        let transactions_refunded = self
            .refunds
            .refund_all_by_offer(&mut tx, offer.id)
            .await?;

        let deleted = self.offers.delete(&mut tx, offer.id).await?;
        if deleted == 0 {
            return Err(DomainError::OfferDeletionFailed.into());
        }

        self.audit
            .log_in(
                &mut tx,
                AuditRecord::new(AuditAction::OfferDeleted)
                    .resource_id(offer.id)
                    .detail(&serde_json::json!({
                        "name": offer.name,
                        "transactions_refunded": transactions_refunded,
                    })),
                context,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            offer_id = %offer.id,
            account_id = %company.id,
            transactions_refunded,
            "Offer deleted"
        );

        Ok(DeleteOfferResult {
            offer_id: offer.id,
            transactions_refunded,
        })
    }
}

//! Create Offer Handler
//!
//! Publishes a new offer after checking that the owner is an active company
//! and the category exists.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::{Amount, DomainError, RequestContext};
use crate::error::AppError;
use crate::model::Offer;
use crate::repository::{AccountRepository, CategoryRepository, OfferRepository};

use super::{require_active_company, CreateOfferCommand};

/// Handler for offer creation
pub struct CreateOfferHandler {
    accounts: AccountRepository,
    categories: CategoryRepository,
    offers: OfferRepository,
    audit: AuditLogService,
}

impl CreateOfferHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            offers: OfferRepository::new(pool.clone()),
            audit: AuditLogService::new(pool),
        }
    }

    /// Execute the create-offer command for the authenticated company.
    pub async fn execute(
        &self,
        command: CreateOfferCommand,
        context: &RequestContext,
    ) -> Result<Offer, AppError> {
        let company = require_active_company(&self.accounts, context.account_id).await?;

        self.categories
            .find(command.category_id)
            .await?
            .ok_or_else(|| DomainError::CategoryNotFound(command.category_id.to_string()))?;

        if command.count < 0 {
            return Err(AppError::InvalidRequest(format!(
                "initial stock cannot be negative (got {})",
                command.count
            )));
        }

        let price = Amount::new(command.price)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let now = Utc::now();
        if command.archive_at <= now {
            return Err(AppError::InvalidRequest(
                "archive_at must be in the future".to_string(),
            ));
        }

        let offer = Offer {
            id: Uuid::new_v4(),
            name: command.name,
            description: command.description,
            count: command.count,
            price,
            created_at: now,
            archive_at: command.archive_at,
            is_archived: false,
            account_id: company.id,
            category_id: command.category_id,
        };

        self.offers.insert(&offer).await?;

        self.audit
            .log(
                AuditRecord::new(AuditAction::OfferCreated)
                    .resource_id(offer.id)
                    .detail(&serde_json::json!({
                        "name": offer.name,
                        "count": offer.count,
                        "price": offer.price.value(),
                        "category_id": offer.category_id,
                    })),
                context,
            )
            .await?;

        tracing::info!(
            offer_id = %offer.id,
            account_id = %company.id,
            name = %offer.name,
            "Offer created"
        );

        Ok(offer)
    }
}

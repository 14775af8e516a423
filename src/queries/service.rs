//! Query Service
//!
//! Read-only projections of accounts, offers, and transactions.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::error::AppError;
use crate::handlers::require_active_company;
use crate::model::{Account, Offer, Purchase};
use crate::repository::{
    offer_from_row, purchase_from_row, AccountRepository, CategoryRepository, OfferRow,
    PurchaseRow,
};

use super::Page;

/// Read-side service for the HTTP layer.
#[derive(Debug, Clone)]
pub struct QueryService {
    accounts: AccountRepository,
    categories: CategoryRepository,
    pool: PgPool,
}

impl QueryService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Profile of the authenticated account.
    pub async fn my_account(&self, account_id: Uuid) -> Result<Account, AppError> {
        self.accounts
            .find(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    /// One of the caller's own offers. Requires an active company.
    pub async fn my_offer(&self, offer_id: Uuid, account_id: Uuid) -> Result<Offer, AppError> {
        let company = require_active_company(&self.accounts, account_id).await?;

        let row: Option<OfferRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, count, price, created_at, archive_at, is_archived,
                   account_id, category_id
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await?;

        let offer = row
            .map(offer_from_row)
            .transpose()?
            .ok_or_else(|| DomainError::OfferNotFound(offer_id.to_string()))?;

        if offer.account_id != company.id {
            return Err(DomainError::OfferAccessDenied.into());
        }

        Ok(offer)
    }

    /// The caller's own offers, newest first. Requires an active company.
    pub async fn my_offers(&self, account_id: Uuid, page: Page) -> Result<Vec<Offer>, AppError> {
        let company = require_active_company(&self.accounts, account_id).await?;

        let rows: Vec<OfferRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, count, price, created_at, archive_at, is_archived,
                   account_id, category_id
            FROM offers
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company.id)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(offer_from_row).collect()
    }

    /// Non-archived offers in the given categories.
    ///
    /// Every id must resolve to a category; otherwise the whole query fails
    /// with `CategoryNotFound`.
    pub async fn offers_by_categories(
        &self,
        category_ids: &[Uuid],
    ) -> Result<Vec<Offer>, AppError> {
        if let Some(missing) = self.categories.find_missing(category_ids).await? {
            return Err(DomainError::CategoryNotFound(missing.to_string()).into());
        }

        let rows: Vec<OfferRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, count, price, created_at, archive_at, is_archived,
                   account_id, category_id
            FROM offers
            WHERE category_id = ANY($1) AND is_archived = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(category_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(offer_from_row).collect()
    }

    /// One of the caller's own purchases.
    pub async fn my_transaction(
        &self,
        transaction_id: Uuid,
        account_id: Uuid,
    ) -> Result<Purchase, AppError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, count, paid, created_at, user_id, offer_id
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        let purchase = row
            .map(purchase_from_row)
            .transpose()?
            .ok_or_else(|| DomainError::TransactionNotFound(transaction_id.to_string()))?;

        if purchase.user_id != account_id {
            return Err(DomainError::TransactionAccessDenied.into());
        }

        Ok(purchase)
    }

    /// The caller's own purchases, newest first.
    pub async fn my_transactions(
        &self,
        account_id: Uuid,
        page: Page,
    ) -> Result<Vec<Purchase>, AppError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, count, paid, created_at, user_id, offer_id
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(purchase_from_row).collect()
    }
}

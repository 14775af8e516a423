//! Offer repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Amount, DomainError};
use crate::error::AppError;
use crate::model::Offer;

pub(crate) type OfferRow = (
    Uuid,
    String,
    Option<String>,
    i32,
    Decimal,
    DateTime<Utc>,
    DateTime<Utc>,
    bool,
    Uuid,
    Uuid,
);

pub(crate) fn offer_from_row(row: OfferRow) -> Result<Offer, AppError> {
    let (id, name, description, count, price, created_at, archive_at, is_archived, account_id, category_id) =
        row;

    let price = Amount::new(price)
        .map_err(|e| AppError::Internal(format!("corrupt offer row {id}: {e}")))?;

    Ok(Offer {
        id,
        name,
        description,
        count,
        price,
        created_at,
        archive_at,
        is_archived,
        account_id,
        category_id,
    })
}

/// Point lookups, inserts, and deletes on the `offers` table.
///
/// Stock counts are not touched here; they only move through the stock
/// manager.
#[derive(Debug, Clone)]
pub struct OfferRepository {
    pool: PgPool,
}

impl OfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new offer.
    ///
    /// The business checks (owner is an active company, category exists) have
    /// already passed at this point, so any database failure here is an
    /// unexplained persistence failure.
    pub async fn insert(&self, offer: &Offer) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO offers
                (id, name, description, count, price, created_at, archive_at, is_archived,
                 account_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(&offer.description)
        .bind(offer.count)
        .bind(offer.price.value())
        .bind(offer.created_at)
        .bind(offer.archive_at)
        .bind(offer.is_archived)
        .bind(offer.account_id)
        .bind(offer.category_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(offer_id = %offer.id, error = %e, "Offer insert failed");
                Err(DomainError::OfferCreationFailed.into())
            }
        }
    }

    /// Load an offer by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<Offer>, AppError> {
        let row: Option<OfferRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, count, price, created_at, archive_at, is_archived,
                   account_id, category_id
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(offer_from_row).transpose()
    }

    /// Delete an offer row inside an open unit of work.
    ///
    /// Returns the number of rows removed.
    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}

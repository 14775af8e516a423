//! Purchase (transaction ledger) repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Amount, DomainError};
use crate::error::AppError;
use crate::model::Purchase;

pub(crate) type PurchaseRow = (Uuid, i32, Decimal, DateTime<Utc>, Uuid, Uuid);

pub(crate) fn purchase_from_row(row: PurchaseRow) -> Result<Purchase, AppError> {
    let (id, count, paid, created_at, user_id, offer_id) = row;

    let paid = Amount::new(paid)
        .map_err(|e| AppError::Internal(format!("corrupt transaction row {id}: {e}")))?;

    Ok(Purchase {
        id,
        count,
        paid,
        created_at,
        user_id,
        offer_id,
    })
}

/// Inserts, lookups, and deletes on the `transactions` table.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a purchase row inside an open unit of work.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        purchase: &Purchase,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, count, paid, created_at, user_id, offer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.count)
        .bind(purchase.paid.value())
        .bind(purchase.created_at)
        .bind(purchase.user_id)
        .bind(purchase.offer_id)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 1 => Ok(()),
            Ok(_) => Err(DomainError::TransactionCreationFailed.into()),
            Err(e) => {
                tracing::error!(transaction_id = %purchase.id, error = %e, "Purchase insert failed");
                Err(DomainError::TransactionCreationFailed.into())
            }
        }
    }

    /// Load a purchase by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<Purchase>, AppError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, count, paid, created_at, user_id, offer_id
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(purchase_from_row).transpose()
    }

    /// Load every purchase of an offer, inside an open unit of work.
    ///
    /// Used by the bulk refund so the set it deposits for is the same set the
    /// following bulk delete removes.
    pub async fn list_by_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
    ) -> Result<Vec<Purchase>, AppError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, count, paid, created_at, user_id, offer_id
            FROM transactions
            WHERE offer_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(offer_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(purchase_from_row).collect()
    }

    /// Delete one purchase row inside an open unit of work.
    pub async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every purchase row of an offer inside an open unit of work.
    pub async fn delete_by_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE offer_id = $1")
            .bind(offer_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}

//! Offer Stock Manager
//!
//! The only place offer stock moves. Increase/decrease run inside a unit of
//! work owned by the caller; the archival sweep runs on its own over the pool
//! and is safe to repeat.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::error::AppError;

/// Stock movements and archival for offers.
#[derive(Debug, Clone)]
pub struct StockManager {
    pool: PgPool,
}

impl StockManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove `count` units from an offer's stock.
    ///
    /// Fails with `OfferNotFound` if the offer is missing,
    /// `InsufficientStock` if fewer than `count` units remain, and
    /// `StockInconsistency` if the persisted delta differs from `count`.
    pub async fn decrease(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
        count: i32,
    ) -> Result<i32, AppError> {
        if count <= 0 {
            return Err(DomainError::InvalidAmount(format!(
                "stock change must be positive (got {count})"
            ))
            .into());
        }

        let before = self.lock_count(tx, offer_id).await?;

        if count > before {
            return Err(DomainError::InsufficientStock {
                requested: count as u32,
                available: before.max(0) as u32,
            }
            .into());
        }

        let after: i32 = sqlx::query_scalar(
            r#"
            UPDATE offers
            SET count = count - $2
            WHERE id = $1
            RETURNING count
            "#,
        )
        .bind(offer_id)
        .bind(count)
        .fetch_one(&mut **tx)
        .await?;

        let observed = i64::from(before) - i64::from(after);
        if observed != i64::from(count) {
            return Err(DomainError::StockInconsistency {
                expected: i64::from(count),
                observed,
            }
            .into());
        }

        tracing::debug!(%offer_id, count, stock = after, "Stock decreased");

        Ok(after)
    }

    /// Return `count` units to an offer's stock.
    ///
    /// Fails with `OfferNotFound` if the offer is missing and
    /// `StockInconsistency` if the persisted delta differs from `count`.
    pub async fn increase(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
        count: i32,
    ) -> Result<i32, AppError> {
        if count <= 0 {
            return Err(DomainError::InvalidAmount(format!(
                "stock change must be positive (got {count})"
            ))
            .into());
        }

        let before = self.lock_count(tx, offer_id).await?;

        let after: i32 = sqlx::query_scalar(
            r#"
            UPDATE offers
            SET count = count + $2
            WHERE id = $1
            RETURNING count
            "#,
        )
        .bind(offer_id)
        .bind(count)
        .fetch_one(&mut **tx)
        .await?;

        let observed = i64::from(after) - i64::from(before);
        if observed != i64::from(count) {
            return Err(DomainError::StockInconsistency {
                expected: i64::from(count),
                observed,
            }
            .into());
        }

        tracing::debug!(%offer_id, count, stock = after, "Stock increased");

        Ok(after)
    }

    /// Archive every offer whose cutoff has passed.
    ///
    /// Idempotent: already-archived rows never match again, so running the
    /// sweep twice archives the same set exactly once. Returns the number of
    /// offers archived in this pass.
    pub async fn archive_due(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE offers
            SET is_archived = TRUE
            WHERE archive_at <= NOW() AND is_archived = FALSE
            "#,
        )
        .execute(&self.pool)
        .await?;

        let rows_archived = result.rows_affected();

        if rows_archived > 0 {
            tracing::info!(rows_archived, "Archived due offers");
        }

        Ok(rows_archived)
    }

    /// Lock the stock row of an offer for the rest of the unit of work and
    /// return the current count.
    async fn lock_count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer_id: Uuid,
    ) -> Result<i32, AppError> {
        let count: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT count
            FROM offers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&mut **tx)
        .await?;

        count.ok_or_else(|| DomainError::OfferNotFound(offer_id.to_string()).into())
    }
}

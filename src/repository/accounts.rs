//! Account repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::model::Account;

type AccountRow = (
    Uuid,
    String,
    Option<String>,
    String,
    Option<Decimal>,
    Option<bool>,
    Option<String>,
    DateTime<Utc>,
);

/// Point lookups and column updates on the `accounts` table.
///
/// Balances are not touched here; they only move through the ledger.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load an account by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, role, balance, is_active, photo_url, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, display_name, role, balance, is_active, photo_url, created_at)| {
            Account::from_columns(
                id,
                email,
                display_name,
                &role,
                balance,
                is_active,
                photo_url,
                created_at,
            )
            .map_err(|e| AppError::Internal(format!("corrupt account row {id}: {e}")))
        })
        .transpose()
    }

    /// Mark a company account active. Returns the number of rows changed.
    pub async fn set_company_active(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_active = TRUE
            WHERE id = $1 AND role = 'company'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Store the photo URL of a company account.
    pub async fn set_company_photo(&self, id: Uuid, url: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET photo_url = $2
            WHERE id = $1 AND role = 'company'
            "#,
        )
        .bind(id)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

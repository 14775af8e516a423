//! Account Ledger
//!
//! The only place user balances move. Both operations run inside a unit of
//! work owned by the caller — the ledger locks the balance row, applies the
//! movement, and re-checks the observed delta, but never commits.

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Amount, Balance, DomainError};
use crate::error::AppError;

/// Balance movements for user accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountLedger;

impl AccountLedger {
    pub fn new() -> Self {
        Self
    }

    /// Add `amount` to a user's balance.
    ///
    /// Fails with `InvalidAmount` for non-positive amounts, `UserNotFound` if
    /// the account is missing or not a user, and `DepositInconsistency` if
    /// the persisted delta differs from `amount`.
    pub async fn deposit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Balance, AppError> {
        let amount = Amount::new(amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let before = self.lock_balance(tx, account_id).await?;

        let after: Decimal = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = balance + $2
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(account_id)
        .bind(amount.value())
        .fetch_one(&mut **tx)
        .await?;

        let observed = after - before;
        if observed != amount.value() {
            return Err(DomainError::DepositInconsistency {
                expected: amount.value(),
                observed,
            }
            .into());
        }

        tracing::debug!(%account_id, %amount, balance = %after, "Deposit applied");

        Balance::new(after).map_err(|e| AppError::Internal(format!("balance after deposit: {e}")))
    }

    /// Subtract `amount` from a user's balance.
    ///
    /// Fails with `InvalidAmount` for non-positive amounts, `UserNotFound` if
    /// the account is missing or not a user, `InsufficientFunds` if the
    /// balance does not cover the amount, and `WithdrawInconsistency` if the
    /// persisted delta differs from `amount`.
    pub async fn withdraw(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Balance, AppError> {
        let amount = Amount::new(amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let before = self.lock_balance(tx, account_id).await?;

        if before < amount.value() {
            return Err(DomainError::InsufficientFunds {
                required: amount.value(),
                available: before,
            }
            .into());
        }

        let after: Decimal = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = balance - $2
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(account_id)
        .bind(amount.value())
        .fetch_one(&mut **tx)
        .await?;

        let observed = before - after;
        if observed != amount.value() {
            return Err(DomainError::WithdrawInconsistency {
                expected: amount.value(),
                observed,
            }
            .into());
        }

        tracing::debug!(%account_id, %amount, balance = %after, "Withdrawal applied");

        Balance::new(after).map_err(|e| AppError::Internal(format!("balance after withdraw: {e}")))
    }

    /// Lock the balance row of a user account for the rest of the unit of
    /// work and return the current balance.
    async fn lock_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: Uuid,
    ) -> Result<Decimal, AppError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT balance
            FROM accounts
            WHERE id = $1 AND role = 'user'
            FOR UPDATE
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?;

        balance.ok_or_else(|| DomainError::UserNotFound(account_id.to_string()).into())
    }
}

//! Audit Log Service
//!
//! Tamper-evident audit logging with hash chain verification. Every money or
//! catalog mutation is recorded; each entry's hash covers the previous
//! entry's hash, so edits to history break the chain.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::RequestContext;

/// Genesis value for the first entry's previous hash.
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Advisory lock key serializing audit appends; the chain must be linear.
const AUDIT_CHAIN_LOCK: i64 = 0x6f66_6665_7273;

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    PurchaseCreated,
    PurchaseRefunded,
    OfferCreated,
    OfferDeleted,
    CategoryCreated,
    CompanyActivated,
    CompanyPhotoUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PurchaseCreated => "transaction.created",
            AuditAction::PurchaseRefunded => "transaction.refunded",
            AuditAction::OfferCreated => "offer.created",
            AuditAction::OfferDeleted => "offer.deleted",
            AuditAction::CategoryCreated => "category.created",
            AuditAction::CompanyActivated => "company.activated",
            AuditAction::CompanyPhotoUpdated => "company.photo_updated",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pending audit record, built by the mutating handler.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    action: AuditAction,
    resource_id: Option<Uuid>,
    detail: Option<serde_json::Value>,
}

impl AuditRecord {
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            resource_id: None,
            detail: None,
        }
    }

    /// Set the mutated resource
    pub fn resource_id(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Attach structured detail about the mutation
    pub fn detail<T: Serialize>(mut self, detail: &T) -> Self {
        self.detail = serde_json::to_value(detail).ok();
        self
    }
}

/// Result of a hash chain verification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    pub is_valid: bool,
    pub entries_checked: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_entry: Option<Uuid>,
}

/// Audit Log Service
#[derive(Debug, Clone)]
pub struct AuditLogService {
    pool: PgPool,
}

impl AuditLogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry inside the caller's open unit of work, so the audit
    /// record commits or rolls back together with the mutation it describes.
    pub async fn log_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: AuditRecord,
        context: &RequestContext,
    ) -> Result<Uuid, sqlx::Error> {
        // Appends must serialize: two writers chaining off the same tail
        // would fork the chain.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(AUDIT_CHAIN_LOCK)
            .execute(&mut **tx)
            .await?;

        let previous_hash: Option<String> = sqlx::query_scalar(
            r#"
            SELECT current_hash
            FROM audit_logs
            ORDER BY sequence_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut **tx)
        .await?;

        let previous_hash = previous_hash.unwrap_or_else(|| GENESIS_HASH.to_string());

        let id = Uuid::new_v4();
        let detail_json = record
            .detail
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        let hash_input = format!(
            "{}{}{}{}{}",
            id,
            record.action.as_str(),
            context.account_id,
            detail_json,
            previous_hash
        );
        let current_hash = sha256_hex(&hash_input);

        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (id, account_id, correlation_id, action, resource_id, detail,
                 previous_hash, current_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(context.account_id)
        .bind(context.correlation_id)
        .bind(record.action.as_str())
        .bind(record.resource_id)
        .bind(&record.detail)
        .bind(&previous_hash)
        .bind(&current_hash)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(audit_id = %id, action = %record.action, "Audit log entry created");

        Ok(id)
    }

    /// Append an entry in its own short transaction (for mutations that do
    /// not run inside a wider unit of work).
    pub async fn log(
        &self,
        record: AuditRecord,
        context: &RequestContext,
    ) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = self.log_in(&mut tx, record, context).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Verify the integrity of the audit log hash chain.
    pub async fn verify_chain(&self, limit: Option<i64>) -> Result<ChainVerification, sqlx::Error> {
        let limit = limit.unwrap_or(1000);

        let entries: Vec<(Uuid, String, Uuid, Option<serde_json::Value>, String, String)> =
            sqlx::query_as(
                r#"
                SELECT id, action, account_id, detail, previous_hash, current_hash
                FROM audit_logs
                ORDER BY sequence_number ASC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut expected_previous = GENESIS_HASH.to_string();

        for (i, (id, action, account_id, detail, previous_hash, current_hash)) in
            entries.iter().enumerate()
        {
            if previous_hash != &expected_previous {
                return Ok(ChainVerification {
                    is_valid: false,
                    entries_checked: i as u64,
                    first_invalid_entry: Some(*id),
                });
            }

            let detail_json = detail.as_ref().map(|v| v.to_string()).unwrap_or_default();
            let hash_input =
                format!("{id}{action}{account_id}{detail_json}{previous_hash}");

            if sha256_hex(&hash_input) != *current_hash {
                return Ok(ChainVerification {
                    is_valid: false,
                    entries_checked: i as u64,
                    first_invalid_entry: Some(*id),
                });
            }

            expected_previous = current_hash.clone();
        }

        Ok(ChainVerification {
            is_valid: true,
            entries_checked: entries.len() as u64,
            first_invalid_entry: None,
        })
    }
}

/// SHA-256 as lowercase hex
fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test input");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        // Deterministic
        assert_eq!(hash, sha256_hex("test input"));
        assert_ne!(hash, sha256_hex("other input"));
    }

    #[test]
    fn test_audit_action_strings() {
        assert_eq!(AuditAction::PurchaseCreated.as_str(), "transaction.created");
        assert_eq!(AuditAction::OfferDeleted.as_str(), "offer.deleted");
    }

    #[test]
    fn test_record_builder() {
        let resource = Uuid::new_v4();
        let record = AuditRecord::new(AuditAction::OfferCreated)
            .resource_id(resource)
            .detail(&serde_json::json!({"count": 3}));

        assert_eq!(record.resource_id, Some(resource));
        assert!(record.detail.is_some());
    }
}

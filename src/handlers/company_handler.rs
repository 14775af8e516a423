//! Company Handlers
//!
//! Admin activation of company accounts, and company photo upload.

use sqlx::PgPool;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::{DomainError, RequestContext};
use crate::error::AppError;
use crate::model::RoleDetail;
use crate::repository::AccountRepository;
use crate::storage::LocalFileStore;

use super::ActivateCompanyCommand;

/// Handler for company activation (admin only)
pub struct ActivateCompanyHandler {
    accounts: AccountRepository,
    audit: AuditLogService,
}

impl ActivateCompanyHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            audit: AuditLogService::new(pool),
        }
    }

    pub async fn execute(
        &self,
        command: ActivateCompanyCommand,
        context: &RequestContext,
    ) -> Result<(), AppError> {
        if !context.is_admin() {
            return Err(AppError::PermissionDenied);
        }

        let account = self
            .accounts
            .find(command.company_id)
            .await?
            .ok_or_else(|| DomainError::CompanyNotFound(command.company_id.to_string()))?;

        match account.detail {
            RoleDetail::Company { is_active: true, .. } => {
                return Err(DomainError::CompanyAlreadyActive.into());
            }
            RoleDetail::Company { .. } => {}
            _ => return Err(DomainError::CompanyNotFound(command.company_id.to_string()).into()),
        }

        let updated = self.accounts.set_company_active(command.company_id).await?;
        if updated == 0 {
            return Err(DomainError::CompanyNotFound(command.company_id.to_string()).into());
        }

        self.audit
            .log(
                AuditRecord::new(AuditAction::CompanyActivated).resource_id(command.company_id),
                context,
            )
            .await?;

        tracing::info!(company_id = %command.company_id, "Company activated");

        Ok(())
    }
}

/// Handler for company photo upload.
///
/// The raw bytes go to the file store; only the resulting URL is persisted on
/// the account.
pub struct SetCompanyPhotoHandler {
    accounts: AccountRepository,
    store: LocalFileStore,
    audit: AuditLogService,
}

impl SetCompanyPhotoHandler {
    pub fn new(pool: PgPool, store: LocalFileStore) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            store,
            audit: AuditLogService::new(pool),
        }
    }

    /// Store the uploaded image and save its URL on the calling company.
    pub async fn execute(
        &self,
        data: &[u8],
        context: &RequestContext,
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::InvalidRequest("empty upload".to_string()));
        }

        let account = self
            .accounts
            .find(context.account_id)
            .await?
            .ok_or_else(|| DomainError::CompanyNotFound(context.account_id.to_string()))?;

        if !matches!(account.detail, RoleDetail::Company { .. }) {
            return Err(DomainError::CompanyNotFound(context.account_id.to_string()).into());
        }

        let url = self.store.save(data, "png").await?;

        let updated = self
            .accounts
            .set_company_photo(account.id, &url)
            .await?;
        if updated == 0 {
            return Err(DomainError::CompanyNotFound(account.id.to_string()).into());
        }

        self.audit
            .log(
                AuditRecord::new(AuditAction::CompanyPhotoUpdated)
                    .resource_id(account.id)
                    .detail(&serde_json::json!({ "photo_url": url })),
                context,
            )
            .await?;

        Ok(url)
    }
}

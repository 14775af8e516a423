//! Command Handlers module
//!
//! One typed handler per state-changing operation. Each handler coordinates
//! repositories, the ledger, and the stock manager, and owns the unit-of-work
//! boundary for its operation.

mod category_handler;
mod commands;
mod company_handler;
mod delete_offer_handler;
mod offer_handler;
mod purchase_handler;
mod refund_handler;


pub use category_handler::CreateCategoryHandler;
pub use commands::*;
pub use company_handler::{ActivateCompanyHandler, SetCompanyPhotoHandler};
pub use delete_offer_handler::DeleteOfferHandler;
pub use offer_handler::CreateOfferHandler;
pub use purchase_handler::PurchaseHandler;
pub use refund_handler::RefundHandler;

use uuid::Uuid;

use crate::domain::DomainError;
use crate::error::AppError;
use crate::model::Account;
use crate::repository::AccountRepository;

/// Resolve an account that must be an active company.
///
/// Fails with `CompanyNotFound` if the account is missing or not a company,
/// and `CompanyNotActive` if it has not been activated yet.
pub(crate) async fn require_active_company(
    accounts: &AccountRepository,
    account_id: Uuid,
) -> Result<Account, AppError> {
    let account = accounts
        .find(account_id)
        .await?
        .filter(|a| matches!(a.detail, crate::model::RoleDetail::Company { .. }))
        .ok_or_else(|| DomainError::CompanyNotFound(account_id.to_string()))?;

    if !account.is_active_company() {
        return Err(DomainError::CompanyNotActive.into());
    }

    Ok(account)
}

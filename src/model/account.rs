//! Account entity
//!
//! An account is a user, a company, or an admin. The role-specific detail is
//! a tagged union fixed at construction, so an account with the wrong detail
//! for its role cannot be represented.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AccountRole, Balance};

/// Role-specific account state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleDetail {
    /// A buyer with a spendable balance
    User { balance: Balance },

    /// An offer-publishing company; inactive until approved by an admin
    Company {
        is_active: bool,
        photo_url: Option<String>,
    },

    /// Platform administrator
    Admin,
}

impl RoleDetail {
    /// The role this detail belongs to
    pub fn role(&self) -> AccountRole {
        match self {
            RoleDetail::User { .. } => AccountRole::User,
            RoleDetail::Company { .. } => AccountRole::Company,
            RoleDetail::Admin => AccountRole::Admin,
        }
    }
}

/// A marketplace account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub detail: RoleDetail,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Reassemble an account from its persisted columns.
    ///
    /// The role column decides which detail columns must be present; a row
    /// that disagrees with its own role is rejected as corrupt.
    pub fn from_columns(
        id: Uuid,
        email: String,
        display_name: Option<String>,
        role: &str,
        balance: Option<Decimal>,
        is_active: Option<bool>,
        photo_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        let role = AccountRole::parse(role).ok_or_else(|| format!("unknown role '{role}'"))?;

        let detail = match role {
            AccountRole::User => {
                let balance = balance.ok_or("user row without balance")?;
                let balance =
                    Balance::new(balance).map_err(|e| format!("user balance invalid: {e}"))?;
                RoleDetail::User { balance }
            }
            AccountRole::Company => {
                let is_active = is_active.ok_or("company row without is_active")?;
                RoleDetail::Company {
                    is_active,
                    photo_url,
                }
            }
            AccountRole::Admin => RoleDetail::Admin,
        };

        Ok(Self {
            id,
            email,
            display_name,
            detail,
            created_at,
        })
    }

    /// The account's role
    pub fn role(&self) -> AccountRole {
        self.detail.role()
    }

    /// Balance, if this account is a user
    pub fn user_balance(&self) -> Option<Balance> {
        match &self.detail {
            RoleDetail::User { balance } => Some(*balance),
            _ => None,
        }
    }

    /// Whether this account is an active company
    pub fn is_active_company(&self) -> bool {
        matches!(self.detail, RoleDetail::Company { is_active: true, .. })
    }
}

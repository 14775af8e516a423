//! Request Context
//!
//! Identity of the authenticated caller, resolved by the auth middleware and
//! trusted as given by everything below it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of an account, as resolved by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Company,
    Admin,
}

impl AccountRole {
    /// Database representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Company => "company",
            AccountRole::Admin => "admin",
        }
    }

    /// Parse the database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(AccountRole::User),
            "company" => Some(AccountRole::Company),
            "admin" => Some(AccountRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context for an operation: the authenticated account plus tracing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Account id of the authenticated caller
    pub account_id: Uuid,

    /// Role of the authenticated caller
    pub role: AccountRole,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl RequestContext {
    /// Create a context for an authenticated account
    pub fn new(account_id: Uuid, role: AccountRole) -> Self {
        Self {
            account_id,
            role,
            correlation_id: None,
        }
    }

    /// Attach a correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Whether the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [AccountRole::User, AccountRole::Company, AccountRole::Admin] {
            assert_eq!(AccountRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(AccountRole::parse("root"), None);
    }

    #[test]
    fn test_context_builder() {
        let account_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let context = RequestContext::new(account_id, AccountRole::Company)
            .with_correlation_id(correlation_id);

        assert_eq!(context.account_id, account_id);
        assert_eq!(context.role, AccountRole::Company);
        assert_eq!(context.correlation_id, Some(correlation_id));
        assert!(!context.is_admin());
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = RequestContext::new(Uuid::new_v4(), AccountRole::User);
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        let id2 = context.ensure_correlation_id();
        assert_eq!(id, id2);
    }
}

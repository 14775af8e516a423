//! Category entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A category that offers are filed under. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

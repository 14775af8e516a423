//! Entity model
//!
//! The four persisted entities of the marketplace and their pure rule
//! methods. Mutation of balances and stock goes through the ledger and stock
//! manager, never through these types directly.

mod account;
mod category;
mod offer;
mod transaction;

pub use account::{Account, RoleDetail};
pub use category::Category;
pub use offer::{Offer, DELETION_GRACE_MINUTES};
pub use transaction::{Purchase, REFUND_WINDOW_MINUTES};

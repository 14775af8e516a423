//! Persistence layer
//!
//! Thin sqlx repositories: point lookups over the pool, mutations through an
//! explicit `Transaction` handle when they belong to a unit of work. Balance
//! and stock columns are off limits here — those move only through the ledger
//! and the stock manager.

mod accounts;
mod categories;
mod offers;
mod transactions;

pub use accounts::AccountRepository;
pub use categories::CategoryRepository;
pub use offers::OfferRepository;
pub use transactions::TransactionRepository;

pub(crate) use offers::{offer_from_row, OfferRow};
pub(crate) use transactions::{purchase_from_row, PurchaseRow};

//! Integration tests for the purchase/refund/delete flows
//!
//! These tests require a database connection.
//! Run with: cargo test --features integration_tests

#![cfg(feature = "integration_tests")]

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use offers_market::domain::{AccountRole, DomainError, RequestContext};
use offers_market::error::AppError;
use offers_market::handlers::{
    CreateOfferCommand, CreateOfferHandler, DeleteOfferCommand, DeleteOfferHandler,
    PurchaseCommand, PurchaseHandler, RefundCommand, RefundHandler,
};
use offers_market::jobs;
use offers_market::ledger::AccountLedger;
use offers_market::queries::QueryService;

mod common;

fn user_context(account_id: uuid::Uuid) -> RequestContext {
    RequestContext::new(account_id, AccountRole::User)
}

fn company_context(account_id: uuid::Uuid) -> RequestContext {
    RequestContext::new(account_id, AccountRole::Company)
}

fn domain_err(err: &AppError) -> Option<&DomainError> {
    match err {
        AppError::Domain(e) => Some(e),
        _ => None,
    }
}

// =========================================================================
// Purchase
// =========================================================================

#[tokio::test]
async fn test_purchase_moves_money_stock_and_ledger() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let handler = PurchaseHandler::new(pool.clone());
    let result = handler
        .execute(PurchaseCommand::new(offer, 3, dec!(150)), &user_context(buyer))
        .await
        .expect("purchase should succeed");

    assert_eq!(result.paid, dec!(150));
    assert_eq!(result.balance, dec!(150));

    assert_eq!(common::user_balance(&pool, buyer).await, dec!(150));
    let (stock, _) = common::offer_state(&pool, offer).await;
    assert_eq!(stock, 7);
    assert!(common::transaction_exists(&pool, result.transaction_id).await);
}

#[tokio::test]
async fn test_purchase_paid_mismatch_changes_nothing() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let handler = PurchaseHandler::new(pool.clone());
    let err = handler
        .execute(
            PurchaseCommand::new(offer, 3, dec!(149.99)),
            &user_context(buyer),
        )
        .await
        .expect_err("mismatched paid must be rejected");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::PaidMismatch { .. })
    ));

    assert_eq!(common::user_balance(&pool, buyer).await, dec!(300));
    let (stock, _) = common::offer_state(&pool, offer).await;
    assert_eq!(stock, 10);
}

#[tokio::test]
async fn test_purchase_of_archived_offer_fails() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    sqlx::query("UPDATE offers SET is_archived = TRUE WHERE id = $1")
        .bind(offer)
        .execute(&pool)
        .await
        .unwrap();

    let handler = PurchaseHandler::new(pool.clone());
    let err = handler
        .execute(PurchaseCommand::new(offer, 1, dec!(50)), &user_context(buyer))
        .await
        .expect_err("archived offer must not be purchasable");

    assert!(matches!(domain_err(&err), Some(DomainError::OfferExpired)));
    assert_eq!(common::user_balance(&pool, buyer).await, dec!(300));
}

#[tokio::test]
async fn test_purchase_rolls_back_when_stock_runs_short() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    // Only 2 in stock, but paid matches 3 units: the withdrawal succeeds
    // inside the unit of work and must be rolled back when the stock
    // decrease fails.
    let offer = common::seed_offer(&pool, company, category, 2, dec!(50)).await;

    let handler = PurchaseHandler::new(pool.clone());
    let err = handler
        .execute(PurchaseCommand::new(offer, 3, dec!(150)), &user_context(buyer))
        .await
        .expect_err("purchase beyond stock must fail");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::InsufficientStock { .. })
    ));

    // Nothing moved: the withdrawal was rolled back with the unit of work
    assert_eq!(common::user_balance(&pool, buyer).await, dec!(300));
    let (stock, _) = common::offer_state(&pool, offer).await;
    assert_eq!(stock, 2);
}

#[tokio::test]
async fn test_purchase_insufficient_funds() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(100)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let handler = PurchaseHandler::new(pool.clone());
    let err = handler
        .execute(PurchaseCommand::new(offer, 3, dec!(150)), &user_context(buyer))
        .await
        .expect_err("purchase beyond balance must fail");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::InsufficientFunds { .. })
    ));

    assert_eq!(common::user_balance(&pool, buyer).await, dec!(100));
    let (stock, _) = common::offer_state(&pool, offer).await;
    assert_eq!(stock, 10);
}

// =========================================================================
// Refund
// =========================================================================

#[tokio::test]
async fn test_refund_within_window_restores_everything() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let purchase = PurchaseHandler::new(pool.clone())
        .execute(PurchaseCommand::new(offer, 3, dec!(150)), &user_context(buyer))
        .await
        .unwrap();

    let refund = RefundHandler::new(pool.clone())
        .execute(
            RefundCommand::new(purchase.transaction_id),
            &user_context(buyer),
        )
        .await
        .expect("refund inside the window should succeed");

    assert_eq!(refund.refunded, dec!(150));
    assert_eq!(refund.balance, dec!(300));

    assert_eq!(common::user_balance(&pool, buyer).await, dec!(300));
    let (stock, _) = common::offer_state(&pool, offer).await;
    assert_eq!(stock, 10);
    assert!(!common::transaction_exists(&pool, purchase.transaction_id).await);
}

#[tokio::test]
async fn test_refund_after_window_fails() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(150)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 7, dec!(50)).await;

    // Created six minutes ago: one minute past the refund window
    let transaction_id = common::seed_transaction_created_at(
        &pool,
        buyer,
        offer,
        3,
        dec!(150),
        Utc::now() - Duration::minutes(6),
    )
    .await;

    let err = RefundHandler::new(pool.clone())
        .execute(RefundCommand::new(transaction_id), &user_context(buyer))
        .await
        .expect_err("expired refund window must be rejected");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::RefundWindowExpired)
    ));

    assert_eq!(common::user_balance(&pool, buyer).await, dec!(150));
    assert!(common::transaction_exists(&pool, transaction_id).await);
}

#[tokio::test]
async fn test_refund_denied_for_non_owner() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let stranger = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let purchase = PurchaseHandler::new(pool.clone())
        .execute(PurchaseCommand::new(offer, 1, dec!(50)), &user_context(buyer))
        .await
        .unwrap();

    let err = RefundHandler::new(pool.clone())
        .execute(
            RefundCommand::new(purchase.transaction_id),
            &user_context(stranger),
        )
        .await
        .expect_err("only the buyer may refund");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::TransactionAccessDenied)
    ));
    assert!(common::transaction_exists(&pool, purchase.transaction_id).await);
}

// =========================================================================
// Offer lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_offer_requires_active_company() {
    let pool = common::setup_test_db().await;
    let company = common::seed_company(&pool, false).await;
    let category = common::seed_category(&pool).await;

    let err = CreateOfferHandler::new(pool.clone())
        .execute(
            CreateOfferCommand::new(
                "Widget".to_string(),
                5,
                dec!(10),
                Utc::now() + Duration::days(7),
                category,
            ),
            &company_context(company),
        )
        .await
        .expect_err("inactive company must not create offers");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::CompanyNotActive)
    ));
}

#[tokio::test]
async fn test_create_offer_unknown_category() {
    let pool = common::setup_test_db().await;
    let company = common::seed_company(&pool, true).await;

    let err = CreateOfferHandler::new(pool.clone())
        .execute(
            CreateOfferCommand::new(
                "Widget".to_string(),
                5,
                dec!(10),
                Utc::now() + Duration::days(7),
                uuid::Uuid::new_v4(),
            ),
            &company_context(company),
        )
        .await
        .expect_err("unknown category must be rejected");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::CategoryNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_offer_refunds_all_buyers() {
    let pool = common::setup_test_db().await;
    let buyer_a = common::seed_user(&pool, dec!(300)).await;
    let buyer_b = common::seed_user(&pool, dec!(500)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let purchases = PurchaseHandler::new(pool.clone());
    let tx_a = purchases
        .execute(PurchaseCommand::new(offer, 2, dec!(100)), &user_context(buyer_a))
        .await
        .unwrap();
    let tx_b = purchases
        .execute(PurchaseCommand::new(offer, 4, dec!(200)), &user_context(buyer_b))
        .await
        .unwrap();

    let result = DeleteOfferHandler::new(pool.clone())
        .execute(DeleteOfferCommand::new(offer), &company_context(company))
        .await
        .expect("delete within the grace window should succeed");

    assert_eq!(result.transactions_refunded, 2);

    // Both buyers got their exact paid amounts back
    assert_eq!(common::user_balance(&pool, buyer_a).await, dec!(300));
    assert_eq!(common::user_balance(&pool, buyer_b).await, dec!(500));

    // Both rows and the offer itself are gone
    assert!(!common::transaction_exists(&pool, tx_a.transaction_id).await);
    assert!(!common::transaction_exists(&pool, tx_b.transaction_id).await);
    assert!(!common::offer_exists(&pool, offer).await);
}

#[tokio::test]
async fn test_delete_offer_after_grace_window_fails() {
    let pool = common::setup_test_db().await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;

    // Created eleven minutes ago: one minute past the grace window
    let offer = common::seed_offer_created_at(
        &pool,
        company,
        category,
        10,
        dec!(50),
        Utc::now() - Duration::minutes(11),
    )
    .await;

    let err = DeleteOfferHandler::new(pool.clone())
        .execute(DeleteOfferCommand::new(offer), &company_context(company))
        .await
        .expect_err("expired grace window must be rejected");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::OfferDeletionWindowExpired)
    ));
    assert!(common::offer_exists(&pool, offer).await);
}

#[tokio::test]
async fn test_delete_offer_denied_for_other_company() {
    let pool = common::setup_test_db().await;
    let owner = common::seed_company(&pool, true).await;
    let other = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, owner, category, 10, dec!(50)).await;

    let err = DeleteOfferHandler::new(pool.clone())
        .execute(DeleteOfferCommand::new(offer), &company_context(other))
        .await
        .expect_err("only the owner may delete");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::OfferAccessDenied)
    ));
    assert!(common::offer_exists(&pool, offer).await);
}

// =========================================================================
// Archival
// =========================================================================

#[tokio::test]
async fn test_archive_sweep_is_idempotent() {
    let pool = common::setup_test_db().await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;

    // Due for archival: archive_at is in the past
    let offer = common::seed_offer_created_at(
        &pool,
        company,
        category,
        10,
        dec!(50),
        Utc::now() - Duration::days(8),
    )
    .await;

    jobs::archive_due_offers(&pool).await.unwrap();
    let (_, archived) = common::offer_state(&pool, offer).await;
    assert!(archived);

    // Second sweep is a no-op on the already-archived row
    jobs::archive_due_offers(&pool).await.unwrap();
    let (_, still_archived) = common::offer_state(&pool, offer).await;
    assert!(still_archived);

    let due_again: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM offers WHERE id = $1 AND is_archived = FALSE)",
    )
    .bind(offer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!due_again);
}

// =========================================================================
// Ledger
// =========================================================================

#[tokio::test]
async fn test_ledger_round_trip_restores_balance() {
    let pool = common::setup_test_db().await;
    let account = common::seed_user(&pool, dec!(300)).await;
    let ledger = AccountLedger::new();

    let mut tx = pool.begin().await.unwrap();
    ledger.withdraw(&mut tx, account, dec!(120)).await.unwrap();
    ledger.deposit(&mut tx, account, dec!(120)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(common::user_balance(&pool, account).await, dec!(300));
}

#[tokio::test]
async fn test_ledger_rejects_non_positive_amounts() {
    let pool = common::setup_test_db().await;
    let account = common::seed_user(&pool, dec!(300)).await;
    let ledger = AccountLedger::new();

    let mut tx = pool.begin().await.unwrap();

    let err = ledger.deposit(&mut tx, account, dec!(0)).await.unwrap_err();
    assert!(matches!(
        domain_err(&err),
        Some(DomainError::InvalidAmount(_))
    ));

    let err = ledger.withdraw(&mut tx, account, dec!(-5)).await.unwrap_err();
    assert!(matches!(
        domain_err(&err),
        Some(DomainError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn test_ledger_rejects_non_user_accounts() {
    let pool = common::setup_test_db().await;
    let company = common::seed_company(&pool, true).await;
    let ledger = AccountLedger::new();

    let mut tx = pool.begin().await.unwrap();
    let err = ledger.deposit(&mut tx, company, dec!(10)).await.unwrap_err();

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::UserNotFound(_))
    ));
}

// =========================================================================
// Queries
// =========================================================================

#[tokio::test]
async fn test_offers_by_categories_rejects_unknown_ids() {
    let pool = common::setup_test_db().await;
    let category = common::seed_category(&pool).await;
    let unknown = uuid::Uuid::new_v4();

    let err = QueryService::new(pool.clone())
        .offers_by_categories(&[category, unknown])
        .await
        .expect_err("unknown category id must fail the whole query");

    assert!(matches!(
        domain_err(&err),
        Some(DomainError::CategoryNotFound(_))
    ));
}

#[tokio::test]
async fn test_my_transactions_only_returns_own_rows() {
    let pool = common::setup_test_db().await;
    let buyer = common::seed_user(&pool, dec!(300)).await;
    let other = common::seed_user(&pool, dec!(300)).await;
    let company = common::seed_company(&pool, true).await;
    let category = common::seed_category(&pool).await;
    let offer = common::seed_offer(&pool, company, category, 10, dec!(50)).await;

    let purchases = PurchaseHandler::new(pool.clone());
    let own = purchases
        .execute(PurchaseCommand::new(offer, 1, dec!(50)), &user_context(buyer))
        .await
        .unwrap();
    purchases
        .execute(PurchaseCommand::new(offer, 1, dec!(50)), &user_context(other))
        .await
        .unwrap();

    let queries = QueryService::new(pool.clone());

    let mine = queries
        .my_transactions(buyer, Default::default())
        .await
        .unwrap();
    assert!(mine.iter().all(|p| p.user_id == buyer));
    assert!(mine.iter().any(|p| p.id == own.transaction_id));

    // Reading someone else's transaction by id is denied
    let err = queries
        .my_transaction(own.transaction_id, other)
        .await
        .expect_err("ownership check must hold for point reads");
    assert!(matches!(
        domain_err(&err),
        Some(DomainError::TransactionAccessDenied)
    ));
}

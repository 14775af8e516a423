//! Common test utilities
//!
//! Connects to the test database, creates the schema if needed, and seeds
//! fixture rows. Every fixture uses fresh ids, so tests do not interfere
//! with each other.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT,
        role TEXT NOT NULL CHECK (role IN ('user', 'company', 'admin')),
        balance NUMERIC(12,2),
        is_active BOOLEAN,
        photo_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CHECK (role <> 'user' OR balance IS NOT NULL),
        CHECK (role <> 'company' OR is_active IS NOT NULL)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS offers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        count INTEGER NOT NULL CHECK (count >= 0),
        price NUMERIC(12,2) NOT NULL CHECK (price > 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        archive_at TIMESTAMPTZ NOT NULL,
        is_archived BOOLEAN NOT NULL DEFAULT FALSE,
        account_id UUID NOT NULL REFERENCES accounts(id),
        category_id UUID NOT NULL REFERENCES categories(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id UUID PRIMARY KEY,
        count INTEGER NOT NULL CHECK (count > 0),
        paid NUMERIC(12,2) NOT NULL CHECK (paid > 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        user_id UUID NOT NULL REFERENCES accounts(id),
        offer_id UUID NOT NULL REFERENCES offers(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_tokens (
        token_hash TEXT PRIMARY KEY,
        account_id UUID NOT NULL REFERENCES accounts(id),
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id UUID PRIMARY KEY,
        sequence_number BIGSERIAL,
        account_id UUID NOT NULL,
        correlation_id UUID,
        action TEXT NOT NULL,
        resource_id UUID,
        detail JSONB,
        previous_hash TEXT NOT NULL,
        current_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Connect to the test database and make sure the schema exists.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to create schema");
    }

    pool
}

/// Seed a user account with the given balance.
pub async fn seed_user(pool: &PgPool, balance: Decimal) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, display_name, role, balance)
        VALUES ($1, $2, 'Test User', 'user', $3)
        "#,
    )
    .bind(id)
    .bind(format!("user-{id}@example.com"))
    .bind(balance)
    .execute(pool)
    .await
    .expect("Failed to seed user");

    id
}

/// Seed a company account.
pub async fn seed_company(pool: &PgPool, is_active: bool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, display_name, role, is_active)
        VALUES ($1, $2, 'Test Company', 'company', $3)
        "#,
    )
    .bind(id)
    .bind(format!("company-{id}@example.com"))
    .bind(is_active)
    .execute(pool)
    .await
    .expect("Failed to seed company");

    id
}

/// Seed an admin account.
pub async fn seed_admin(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, display_name, role)
        VALUES ($1, $2, 'Test Admin', 'admin')
        "#,
    )
    .bind(id)
    .bind(format!("admin-{id}@example.com"))
    .execute(pool)
    .await
    .expect("Failed to seed admin");

    id
}

/// Seed a category.
pub async fn seed_category(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, description)
        VALUES ($1, $2, 'Fixture category')
        "#,
    )
    .bind(id)
    .bind(format!("category-{id}"))
    .execute(pool)
    .await
    .expect("Failed to seed category");

    id
}

/// Seed an offer created now, archived a week out.
pub async fn seed_offer(
    pool: &PgPool,
    account_id: Uuid,
    category_id: Uuid,
    count: i32,
    price: Decimal,
) -> Uuid {
    seed_offer_created_at(pool, account_id, category_id, count, price, Utc::now()).await
}

/// Seed an offer with an explicit creation time (for grace-window tests).
pub async fn seed_offer_created_at(
    pool: &PgPool,
    account_id: Uuid,
    category_id: Uuid,
    count: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO offers
            (id, name, description, count, price, created_at, archive_at, is_archived,
             account_id, category_id)
        VALUES ($1, 'Fixture offer', NULL, $2, $3, $4, $5, FALSE, $6, $7)
        "#,
    )
    .bind(id)
    .bind(count)
    .bind(price)
    .bind(created_at)
    .bind(created_at + Duration::days(7))
    .bind(account_id)
    .bind(category_id)
    .execute(pool)
    .await
    .expect("Failed to seed offer");

    id
}

/// Seed a transaction row with an explicit creation time (for refund-window
/// tests).
pub async fn seed_transaction_created_at(
    pool: &PgPool,
    user_id: Uuid,
    offer_id: Uuid,
    count: i32,
    paid: Decimal,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO transactions (id, count, paid, created_at, user_id, offer_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(count)
    .bind(paid)
    .bind(created_at)
    .bind(user_id)
    .bind(offer_id)
    .execute(pool)
    .await
    .expect("Failed to seed transaction");

    id
}

/// Seed an auth token for an account; returns the bearer token string.
pub async fn seed_token(pool: &PgPool, account_id: Uuid) -> String {
    let token = format!("test-token-{}", Uuid::new_v4());
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (token_hash, account_id, expires_at)
        VALUES (encode(sha256($1::bytea), 'hex'), $2, NOW() + INTERVAL '1 hour')
        "#,
    )
    .bind(token.as_bytes())
    .bind(account_id)
    .execute(pool)
    .await
    .expect("Failed to seed auth token");

    token
}

/// Current balance of a user account.
pub async fn user_balance(pool: &PgPool, account_id: Uuid) -> Decimal {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

/// Current stock and archival flag of an offer.
pub async fn offer_state(pool: &PgPool, offer_id: Uuid) -> (i32, bool) {
    sqlx::query_as("SELECT count, is_archived FROM offers WHERE id = $1")
        .bind(offer_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read offer")
}

/// Whether a transaction row still exists.
pub async fn transaction_exists(pool: &PgPool, id: Uuid) -> bool {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM transactions WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to read transaction")
}

/// Whether an offer row still exists.
pub async fn offer_exists(pool: &PgPool, id: Uuid) -> bool {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM offers WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to read offer")
}

//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditLogService, ChainVerification};
use crate::domain::{AccountRole, RequestContext};
use crate::error::AppError;
use crate::handlers::{
    ActivateCompanyCommand, ActivateCompanyHandler, CreateCategoryCommand, CreateCategoryHandler,
    CreateOfferCommand, CreateOfferHandler, DeleteOfferCommand, DeleteOfferHandler,
    PurchaseCommand, PurchaseHandler, RefundCommand, RefundHandler, SetCompanyPhotoHandler,
};
use crate::jobs::JobScheduler;
use crate::model::{Account, Offer, Purchase, RoleDetail};
use crate::queries::{Page, QueryService};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::new(query.page_number, query.page_size)
    }
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: AccountRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let (balance, is_active, photo_url) = match &account.detail {
            RoleDetail::User { balance } => (Some(balance.value()), None, None),
            RoleDetail::Company {
                is_active,
                photo_url,
            } => (None, Some(*is_active), photo_url.clone()),
            RoleDetail::Admin => (None, None, None),
        };

        let role = account.role();
        Self {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
            role,
            balance,
            is_active,
            photo_url,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub count: i32,
    pub price: Decimal,
    pub archive_at: DateTime<Utc>,
    pub category_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub count: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub archive_at: DateTime<Utc>,
    pub is_archived: bool,
    pub account_id: Uuid,
    pub category_id: Uuid,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.id,
            name: offer.name,
            description: offer.description,
            count: offer.count,
            price: offer.price.value(),
            created_at: offer.created_at,
            archive_at: offer.archive_at,
            is_archived: offer.is_archived,
            account_id: offer.account_id,
            category_id: offer.category_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OffersByCategoriesQuery {
    /// Comma-separated category ids
    pub category_ids: String,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub offer_id: Uuid,
    pub count: i32,
    pub paid: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub transaction_id: Uuid,
    pub offer_id: Uuid,
    pub count: i32,
    pub paid: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub count: i32,
    pub paid: Decimal,
    pub created_at: DateTime<Utc>,
    pub offer_id: Uuid,
}

impl From<Purchase> for TransactionResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            id: purchase.id,
            count: purchase.count,
            paid: purchase.paid.value(),
            created_at: purchase.created_at,
            offer_id: purchase.offer_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub transaction_id: Uuid,
    pub refunded: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DeleteOfferResponse {
    pub offer_id: Uuid,
    pub transactions_refunded: u64,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub photo_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditVerifyQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Account endpoints
        .route("/accounts/me", get(get_my_account))
        .route("/accounts/companies/:company_id/activate", post(activate_company))
        .route("/accounts/companies/photo", post(set_company_photo))
        // Category endpoints
        .route("/categories", post(create_category))
        .route("/categories", get(list_categories))
        // Offer endpoints
        .route("/offers", post(create_offer))
        .route("/offers", get(get_offers_by_categories))
        .route("/offers/mine", get(get_my_offers))
        .route("/offers/mine/:offer_id", get(get_my_offer))
        .route("/offers/:offer_id", delete(delete_offer))
        // Transaction endpoints
        .route("/transactions", post(create_transaction))
        .route("/transactions/mine", get(get_my_transactions))
        .route("/transactions/mine/:transaction_id", get(get_my_transaction))
        .route("/transactions/:transaction_id", delete(refund_transaction))
        // Admin endpoints
        .route("/admin/audit/verify", get(verify_audit_chain))
        .route("/admin/jobs/run", post(run_maintenance_jobs))
}

// =========================================================================
// Accounts
// =========================================================================

/// Profile of the authenticated account
async fn get_my_account(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = QueryService::new(pool).my_account(context.account_id).await?;

    Ok(Json(account.into()))
}

/// Activate a company account (admin only)
async fn activate_company(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(company_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handler = ActivateCompanyHandler::new(pool);
    handler
        .execute(ActivateCompanyCommand::new(company_id), &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Upload the calling company's photo
async fn set_company_photo(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    body: Bytes,
) -> Result<Json<PhotoResponse>, AppError> {
    let handler = SetCompanyPhotoHandler::new(state.pool, state.store);
    let photo_url = handler.execute(&body, &context).await?;

    Ok(Json(PhotoResponse { photo_url }))
}

// =========================================================================
// Categories
// =========================================================================

/// Create a category (admin only)
async fn create_category(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let handler = CreateCategoryHandler::new(pool);

    let command = CreateCategoryCommand {
        name: request.name,
        description: request.description,
    };

    let category = handler.execute(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            id: category.id,
            name: category.name,
            description: category.description,
        }),
    ))
}

/// List all categories
async fn list_categories(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = crate::repository::CategoryRepository::new(pool)
        .list()
        .await?;

    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryResponse {
                id: c.id,
                name: c.name,
                description: c.description,
            })
            .collect(),
    ))
}

// =========================================================================
// Offers
// =========================================================================

/// Publish a new offer (active companies only)
async fn create_offer(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    let handler = CreateOfferHandler::new(pool);

    let command = CreateOfferCommand {
        name: request.name,
        description: request.description,
        count: request.count,
        price: request.price,
        archive_at: request.archive_at,
        category_id: request.category_id,
    };

    let offer = handler.execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(offer.into())))
}

/// Non-archived offers in the given categories
async fn get_offers_by_categories(
    State(pool): State<PgPool>,
    Query(query): Query<OffersByCategoriesQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let category_ids: Vec<Uuid> = query
        .category_ids
        .split(',')
        .map(|s| {
            Uuid::parse_str(s.trim())
                .map_err(|_| AppError::InvalidRequest(format!("invalid category id: {s}")))
        })
        .collect::<Result<_, _>>()?;

    let offers = QueryService::new(pool)
        .offers_by_categories(&category_ids)
        .await?;

    Ok(Json(offers.into_iter().map(Into::into).collect()))
}

/// The caller's own offers, paginated
async fn get_my_offers(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let offers = QueryService::new(pool)
        .my_offers(context.account_id, page.into())
        .await?;

    Ok(Json(offers.into_iter().map(Into::into).collect()))
}

/// One of the caller's own offers
async fn get_my_offer(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = QueryService::new(pool)
        .my_offer(offer_id, context.account_id)
        .await?;

    Ok(Json(offer.into()))
}

/// Delete an offer within its grace window, refunding all purchases
async fn delete_offer(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<DeleteOfferResponse>, AppError> {
    let handler = DeleteOfferHandler::new(pool);

    let result = handler
        .execute(DeleteOfferCommand::new(offer_id), &context)
        .await?;

    Ok(Json(DeleteOfferResponse {
        offer_id: result.offer_id,
        transactions_refunded: result.transactions_refunded,
    }))
}

// =========================================================================
// Transactions
// =========================================================================

/// Purchase units of an offer
async fn create_transaction(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let handler = PurchaseHandler::new(pool);

    let command = PurchaseCommand::new(request.offer_id, request.count, request.paid);
    let result = handler.execute(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            transaction_id: result.transaction_id,
            offer_id: result.offer_id,
            count: result.count,
            paid: result.paid,
            balance: result.balance,
        }),
    ))
}

/// The caller's own purchases, paginated
async fn get_my_transactions(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let purchases = QueryService::new(pool)
        .my_transactions(context.account_id, page.into())
        .await?;

    Ok(Json(purchases.into_iter().map(Into::into).collect()))
}

/// One of the caller's own purchases
async fn get_my_transaction(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    let purchase = QueryService::new(pool)
        .my_transaction(transaction_id, context.account_id)
        .await?;

    Ok(Json(purchase.into()))
}

/// Refund a purchase within its refund window
async fn refund_transaction(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<RefundResponse>, AppError> {
    let handler = RefundHandler::new(pool);

    let result = handler
        .execute(RefundCommand::new(transaction_id), &context)
        .await?;

    Ok(Json(RefundResponse {
        transaction_id: result.transaction_id,
        refunded: result.refunded,
        balance: result.balance,
    }))
}

// =========================================================================
// Admin
// =========================================================================

/// Verify the audit log hash chain (admin only)
async fn verify_audit_chain(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
    Query(query): Query<AuditVerifyQuery>,
) -> Result<Json<ChainVerification>, AppError> {
    if !context.is_admin() {
        return Err(AppError::PermissionDenied);
    }

    let verification = AuditLogService::new(pool).verify_chain(query.limit).await?;

    Ok(Json(verification))
}

/// Run all maintenance jobs once (admin only)
async fn run_maintenance_jobs(
    State(pool): State<PgPool>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !context.is_admin() {
        return Err(AppError::PermissionDenied);
    }

    let report = JobScheduler::new(pool).run_all_once().await;

    Ok(Json(serde_json::json!({
        "offers_archived": report.offers_archived,
        "auth_tokens_deleted": report.auth_tokens_deleted,
        "errors": report.errors,
        "completed_at": report.completed_at,
    })))
}

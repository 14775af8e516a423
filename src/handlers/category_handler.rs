//! Create Category Handler

use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLogService, AuditRecord};
use crate::domain::RequestContext;
use crate::error::AppError;
use crate::model::Category;
use crate::repository::CategoryRepository;

use super::CreateCategoryCommand;

/// Handler for category creation (admin only)
pub struct CreateCategoryHandler {
    categories: CategoryRepository,
    audit: AuditLogService,
}

impl CreateCategoryHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool.clone()),
            audit: AuditLogService::new(pool),
        }
    }

    pub async fn execute(
        &self,
        command: CreateCategoryCommand,
        context: &RequestContext,
    ) -> Result<Category, AppError> {
        if !context.is_admin() {
            return Err(AppError::PermissionDenied);
        }

        if command.name.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "category name cannot be empty".to_string(),
            ));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: command.name,
            description: command.description,
        };

        self.categories.insert(&category).await?;

        self.audit
            .log(
                AuditRecord::new(AuditAction::CategoryCreated)
                    .resource_id(category.id)
                    .detail(&serde_json::json!({ "name": category.name })),
                context,
            )
            .await?;

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");

        Ok(category)
    }
}

//! Category repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::error::AppError;
use crate::model::Category;

/// Unique-violation SQLSTATE, used to detect duplicate category names.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new category. Duplicate names are rejected.
    pub async fn insert(&self, category: &Category) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => Err(
                DomainError::CategoryAlreadyExists(category.name.clone()).into(),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a category by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let row: Option<(Uuid, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, name, description
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, description)| Category {
            id,
            name,
            description,
        }))
    }

    /// List all categories by name.
    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        let rows: Vec<(Uuid, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, name, description
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description)| Category {
                id,
                name,
                description,
            })
            .collect())
    }

    /// Return the first id in `ids` that does not resolve to a category.
    pub async fn find_missing(&self, ids: &[Uuid]) -> Result<Option<Uuid>, AppError> {
        let known: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM categories WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.iter().find(|id| !known.contains(id)).copied())
    }
}

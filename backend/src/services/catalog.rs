//! Global product catalog service
//!
//! The catalog holds vendor-independent reference data that shop products
//! link to. Catalog writes are admin-only; reads are open to any
//! authenticated actor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;
use shared::validation::{validate_barcode, validate_money};

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Catalog category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a catalog category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Global product record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GlobalProduct {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub suggested_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a global product
#[derive(Debug, Deserialize)]
pub struct CreateGlobalProductInput {
    pub name: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub suggested_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a catalog category (admin only)
    pub async fn create_category(
        &self,
        actor: &Actor,
        input: CreateCategoryInput,
    ) -> AppResult<Category> {
        if !actor.is_admin() {
            return Err(AppError::InsufficientPermissions);
        }

        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Category name is required",
                "Jina la kundi linahitajika",
            ));
        }

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("name".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(category)
    }

    /// List all catalog categories
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Create a global product (admin only)
    pub async fn create_global_product(
        &self,
        actor: &Actor,
        input: CreateGlobalProductInput,
    ) -> AppResult<GlobalProduct> {
        if !actor.is_admin() {
            return Err(AppError::InsufficientPermissions);
        }

        self.validate_global_product_input(&input)?;

        let name_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global_products WHERE name = $1)",
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        if name_taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        if let Some(barcode) = &input.barcode {
            let barcode_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM global_products WHERE barcode = $1)",
            )
            .bind(barcode)
            .fetch_one(&self.db)
            .await?;

            if barcode_taken {
                return Err(AppError::DuplicateEntry("barcode".to_string()));
            }
        }

        let product = sqlx::query_as::<_, GlobalProduct>(
            r#"
            INSERT INTO global_products (name, barcode, description, image_ref, suggested_price, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, barcode, description, image_ref, suggested_price, category_id,
                      created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.barcode)
        .bind(&input.description)
        .bind(&input.image_ref)
        .bind(input.suggested_price)
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// List global products, optionally filtered by category
    pub async fn list_global_products(
        &self,
        category_id: Option<Uuid>,
    ) -> AppResult<Vec<GlobalProduct>> {
        let products = sqlx::query_as::<_, GlobalProduct>(
            r#"
            SELECT id, name, barcode, description, image_ref, suggested_price, category_id,
                   created_at, updated_at
            FROM global_products
            WHERE ($1::uuid IS NULL OR category_id = $1)
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Get a global product by id
    pub async fn get_global_product(&self, id: Uuid) -> AppResult<GlobalProduct> {
        sqlx::query_as::<_, GlobalProduct>(
            r#"
            SELECT id, name, barcode, description, image_ref, suggested_price, category_id,
                   created_at, updated_at
            FROM global_products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Global product".to_string()))
    }

    /// Search the catalog by partial name or exact barcode
    pub async fn search(&self, query: &str) -> AppResult<Vec<GlobalProduct>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", trimmed.replace('%', "\\%").replace('_', "\\_"));

        let products = sqlx::query_as::<_, GlobalProduct>(
            r#"
            SELECT id, name, barcode, description, image_ref, suggested_price, category_id,
                   created_at, updated_at
            FROM global_products
            WHERE name ILIKE $1 OR barcode = $2
            ORDER BY name
            LIMIT 50
            "#,
        )
        .bind(&pattern)
        .bind(trimmed)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    fn validate_global_product_input(&self, input: &CreateGlobalProductInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Product name is required",
                "Jina la bidhaa linahitajika",
            ));
        }

        if let Some(barcode) = &input.barcode {
            if let Err(msg) = validate_barcode(barcode) {
                return Err(AppError::validation("barcode", msg, "Msimbo si sahihi"));
            }
        }

        if let Some(price) = input.suggested_price {
            if let Err(msg) = validate_money(price) {
                return Err(AppError::validation(
                    "suggested_price",
                    msg,
                    "Bei iliyopendekezwa si sahihi",
                ));
            }
        }

        Ok(())
    }
}

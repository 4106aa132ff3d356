//! Shop management service
//!
//! Shops are the tenant boundary: every product, worker, and ledger entry
//! belongs to exactly one shop, and manager assignments on the shop drive
//! access scoping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;

/// Shop service
#[derive(Clone)]
pub struct ShopService {
    db: PgPool,
}

/// Shop record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub business_id: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub require_image_upload: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a shop
#[derive(Debug, Deserialize)]
pub struct CreateShopInput {
    pub name: String,
    pub business_id: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    #[serde(default)]
    pub require_image_upload: bool,
    #[serde(default)]
    pub shop_category_ids: Vec<Uuid>,
}

/// Input for updating a shop
#[derive(Debug, Deserialize)]
pub struct UpdateShopInput {
    pub name: Option<String>,
    pub business_id: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub require_image_upload: Option<bool>,
    /// Replaces the full set of category links when present
    pub shop_category_ids: Option<Vec<Uuid>>,
}

/// Shop classification tag
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShopCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a shop category
#[derive(Debug, Deserialize)]
pub struct CreateShopCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Per-category rollup across a shop's inventory
#[derive(Debug, Serialize, FromRow)]
pub struct CategorySummary {
    pub category_name: String,
    pub product_count: i64,
    /// Current stock x product price, summed over the category
    pub stock_value: Decimal,
    /// Sum of quantity x selling price over recorded sales
    pub sales_value: Decimal,
    /// Total quantity customers asked for and did not get
    pub missed_sale_quantity: Decimal,
}

impl ShopService {
    /// Create a new ShopService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a shop; the creating manager is assigned to it automatically
    pub async fn create_shop(&self, actor: &Actor, input: CreateShopInput) -> AppResult<Shop> {
        let user_id = match actor {
            Actor::Manager { user_id, .. } => *user_id,
            Actor::Worker { .. } => return Err(AppError::InsufficientPermissions),
        };

        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Shop name is required",
                "Jina la duka linahitajika",
            ));
        }

        let name_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shops WHERE name = $1)",
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        if name_taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let shop = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (name, business_id, address, latitude, longitude, require_image_upload)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, business_id, address, latitude, longitude, require_image_upload,
                      created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.business_id)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.require_image_upload)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO shop_managers (shop_id, user_id) VALUES ($1, $2)")
            .bind(shop.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for category_id in &input.shop_category_ids {
            sqlx::query(
                "INSERT INTO shop_category_links (shop_id, shop_category_id) VALUES ($1, $2)",
            )
            .bind(shop.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(shop)
    }

    /// List shops visible to the actor
    pub async fn list_shops(&self, actor: &Actor) -> AppResult<Vec<Shop>> {
        let visible = actor.visible_shops();

        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, business_id, address, latitude, longitude, require_image_upload,
                   created_at, updated_at
            FROM shops
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY name
            "#,
        )
        .bind(visible)
        .fetch_all(&self.db)
        .await?;

        Ok(shops)
    }

    /// Get a single shop, scoped to the actor
    pub async fn get_shop(&self, actor: &Actor, shop_id: Uuid) -> AppResult<Shop> {
        if !actor.can_record_for(shop_id) && !actor.is_admin() {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, business_id, address, latitude, longitude, require_image_upload,
                   created_at, updated_at
            FROM shops
            WHERE id = $1
            "#,
        )
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))
    }

    /// Update a shop; managers of the shop only
    pub async fn update_shop(
        &self,
        actor: &Actor,
        shop_id: Uuid,
        input: UpdateShopInput,
    ) -> AppResult<Shop> {
        if !actor.can_manage(shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let existing = self.get_shop(actor, shop_id).await?;

        let name = input.name.unwrap_or(existing.name);
        if name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Shop name is required",
                "Jina la duka linahitajika",
            ));
        }

        let mut tx = self.db.begin().await?;

        let shop = sqlx::query_as::<_, Shop>(
            r#"
            UPDATE shops
            SET name = $1, business_id = $2, address = $3, latitude = $4, longitude = $5,
                require_image_upload = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING id, name, business_id, address, latitude, longitude, require_image_upload,
                      created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .bind(input.business_id.or(existing.business_id))
        .bind(input.address.or(existing.address))
        .bind(input.latitude.or(existing.latitude))
        .bind(input.longitude.or(existing.longitude))
        .bind(
            input
                .require_image_upload
                .unwrap_or(existing.require_image_upload),
        )
        .bind(shop_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(category_ids) = &input.shop_category_ids {
            sqlx::query("DELETE FROM shop_category_links WHERE shop_id = $1")
                .bind(shop_id)
                .execute(&mut *tx)
                .await?;

            for category_id in category_ids {
                sqlx::query(
                    "INSERT INTO shop_category_links (shop_id, shop_category_id) VALUES ($1, $2)",
                )
                .bind(shop_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(shop)
    }

    /// Assign another manager to a shop
    pub async fn add_manager(&self, actor: &Actor, shop_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if !actor.can_manage(shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let user_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !user_exists {
            return Err(AppError::NotFound("User".to_string()));
        }

        sqlx::query(
            "INSERT INTO shop_managers (shop_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(shop_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Create a shop classification tag (admin only)
    pub async fn create_shop_category(
        &self,
        actor: &Actor,
        input: CreateShopCategoryInput,
    ) -> AppResult<ShopCategory> {
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

        let category = sqlx::query_as::<_, ShopCategory>(
            r#"
            INSERT INTO shop_categories (name, description)
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

    /// List all shop categories
    pub async fn list_shop_categories(&self) -> AppResult<Vec<ShopCategory>> {
        let categories = sqlx::query_as::<_, ShopCategory>(
            "SELECT id, name, description, created_at FROM shop_categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Product counts per catalog category for one shop
    ///
    /// Unlinked products (no catalog category) are reported under
    /// "Uncategorized".
    pub async fn categories_summary(
        &self,
        actor: &Actor,
        shop_id: Uuid,
    ) -> AppResult<Vec<CategorySummary>> {
        if actor.visible_shops().is_some_and(|shops| !shops.contains(&shop_id)) {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        let rows = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT COALESCE(c.name, 'Uncategorized') AS category_name,
                   COUNT(p.id) AS product_count,
                   COALESCE(SUM(
                       (COALESCE((SELECT SUM(quantity) FROM stock_entries WHERE product_id = p.id), 0)
                        - COALESCE((SELECT SUM(quantity) FROM sale_entries WHERE product_id = p.id), 0))
                       * p.price
                   ), 0) AS stock_value,
                   COALESCE(SUM(
                       COALESCE((SELECT SUM(quantity * selling_price) FROM sale_entries WHERE product_id = p.id), 0)
                   ), 0) AS sales_value,
                   COALESCE(SUM(
                       COALESCE((SELECT SUM(quantity_requested) FROM missed_sale_entries WHERE product_id = p.id), 0)
                   ), 0) AS missed_sale_quantity
            FROM products p
            LEFT JOIN global_products gp ON gp.id = p.global_product_id
            LEFT JOIN categories c ON c.id = gp.category_id
            WHERE p.shop_id = $1
            GROUP BY COALESCE(c.name, 'Uncategorized')
            ORDER BY product_count DESC, category_name
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}

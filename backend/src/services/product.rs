//! Shop product registry service
//!
//! Handles the explicit product lifecycle: creation by managers, review of
//! products auto-created during entry recording, and linking to the global
//! catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;
use shared::types::{ProductStatus, QualityType, QuantityType};
use shared::validation::{validate_barcode, validate_money};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Shop product record with derived stock
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub global_product_id: Option<Uuid>,
    pub name: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity_type: String,
    pub quality_type: Option<String>,
    pub status: String,
    pub image_ref: Option<String>,
    pub current_stock: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub shop_id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity_type: Option<QuantityType>,
    pub quality_type: Option<QualityType>,
    pub image_ref: Option<String>,
    /// Link to an existing catalog entry
    pub global_product_id: Option<Uuid>,
    /// Propose a new catalog entry and link to it
    pub new_global_product_name: Option<String>,
    pub new_global_product_description: Option<String>,
    pub new_global_product_category_id: Option<Uuid>,
    /// Required when proposing a new catalog entry
    pub suggested_price: Option<Decimal>,
    /// Explicit status override; otherwise derived from linking
    pub status: Option<ProductStatus>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    /// `Some(None)` clears the stored barcode
    #[serde(default, with = "double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub quality_type: Option<QualityType>,
    #[serde(default, with = "double_option")]
    pub image_ref: Option<Option<String>>,
    /// `Some(None)` unlinks; `Some(Some(id))` relinks
    #[serde(default, with = "double_option")]
    pub global_product_id: Option<Option<Uuid>>,
    pub status: Option<ProductStatus>,
}

/// Serde helper distinguishing an absent field from an explicit null
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.shop_id, p.global_product_id, p.name, p.barcode, p.description, p.price,
    p.quantity_type, p.quality_type, p.status, p.image_ref,
    (COALESCE((SELECT SUM(quantity) FROM stock_entries WHERE product_id = p.id), 0)
     - COALESCE((SELECT SUM(quantity) FROM sale_entries WHERE product_id = p.id), 0)) AS current_stock,
    p.created_at, p.updated_at
"#;

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product explicitly; managers of the shop only. Workers add
    /// products implicitly through entry resolution.
    pub async fn create_product(&self, actor: &Actor, input: CreateProductInput) -> AppResult<Product> {
        if !actor.can_manage(input.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Product name is required",
                "Jina la bidhaa linahitajika",
            ));
        }

        if let Err(msg) = validate_money(input.price) {
            return Err(AppError::validation("price", msg, "Bei si sahihi"));
        }

        if let Some(barcode) = &input.barcode {
            if let Err(msg) = validate_barcode(barcode) {
                return Err(AppError::validation("barcode", msg, "Msimbo si sahihi"));
            }
        }

        if input.global_product_id.is_some() && input.new_global_product_name.is_some() {
            return Err(AppError::validation(
                "global_product_id",
                "Provide either global_product_id or new_global_product_name, not both",
                "Taja kiungo cha katalogi au jina jipya, si vyote viwili",
            ));
        }

        let name_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE shop_id = $1 AND LOWER(name) = LOWER($2))",
        )
        .bind(input.shop_id)
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        if name_taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let global_product_id = match (&input.global_product_id, &input.new_global_product_name) {
            (Some(id), None) => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM global_products WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

                if !exists {
                    return Err(AppError::NotFound("Global product".to_string()));
                }
                Some(*id)
            }
            (None, Some(new_name)) => {
                let suggested_price = input.suggested_price.ok_or_else(|| {
                    AppError::validation(
                        "suggested_price",
                        "A suggested price is required when proposing a new global product",
                        "Bei iliyopendekezwa inahitajika kwa bidhaa mpya ya katalogi",
                    )
                })?;

                if let Err(msg) = validate_money(suggested_price) {
                    return Err(AppError::validation(
                        "suggested_price",
                        msg,
                        "Bei iliyopendekezwa si sahihi",
                    ));
                }

                // Reuse an existing catalog entry with the same name rather
                // than failing on the unique constraint
                let existing = sqlx::query_scalar::<_, Option<Uuid>>(
                    "SELECT id FROM global_products WHERE LOWER(name) = LOWER($1)",
                )
                .bind(new_name.trim())
                .fetch_optional(&mut *tx)
                .await?
                .flatten();

                match existing {
                    Some(id) => Some(id),
                    None => {
                        let id = sqlx::query_scalar::<_, Uuid>(
                            r#"
                            INSERT INTO global_products (name, barcode, description, suggested_price, category_id)
                            VALUES ($1, $2, $3, $4, $5)
                            RETURNING id
                            "#,
                        )
                        .bind(new_name.trim())
                        .bind(&input.barcode)
                        .bind(&input.new_global_product_description)
                        .bind(suggested_price)
                        .bind(input.new_global_product_category_id)
                        .fetch_one(&mut *tx)
                        .await?;
                        Some(id)
                    }
                }
            }
            _ => None,
        };

        // Linked products skip review unless the caller says otherwise
        let status = input.status.unwrap_or(if global_product_id.is_some() {
            ProductStatus::Linked
        } else {
            ProductStatus::PendingReview
        });

        let quantity_type = input.quantity_type.unwrap_or_default();

        let query = format!(
            r#"
            INSERT INTO products (shop_id, global_product_id, name, barcode, description, price,
                                  quantity_type, quality_type, status, image_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS.replace("p.", "products.")
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(input.shop_id)
            .bind(global_product_id)
            .bind(input.name.trim())
            .bind(&input.barcode)
            .bind(&input.description)
            .bind(input.price)
            .bind(quantity_type.as_str())
            .bind(input.quality_type.map(|q| q.as_str()))
            .bind(status.as_str())
            .bind(&input.image_ref)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// List products visible to the actor, optionally filtered by shop
    /// or status
    pub async fn list_products(
        &self,
        actor: &Actor,
        shop_id: Option<Uuid>,
        status: Option<ProductStatus>,
    ) -> AppResult<Vec<Product>> {
        let visible = actor.visible_shops();

        let query = format!(
            r#"
            SELECT {}
            FROM products p
            WHERE ($1::uuid[] IS NULL OR p.shop_id = ANY($1))
              AND ($2::uuid IS NULL OR p.shop_id = $2)
              AND ($3::text IS NULL OR p.status = $3)
            ORDER BY p.name
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(visible)
            .bind(shop_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.db)
            .await?;

        Ok(products)
    }

    /// Get a product, scoped to the actor
    pub async fn get_product(&self, actor: &Actor, product_id: Uuid) -> AppResult<Product> {
        let query = format!("SELECT {} FROM products p WHERE p.id = $1", PRODUCT_COLUMNS);

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&product.shop_id))
        {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(product)
    }

    /// Update a product; managers of the shop only
    ///
    /// Unlinking from the catalog sends the product back to PENDING_REVIEW
    /// unless the update carries an explicit status.
    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(actor, product_id).await?;

        if !actor.can_manage(existing.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let price = input.price.unwrap_or(existing.price);
        if let Err(msg) = validate_money(price) {
            return Err(AppError::validation("price", msg, "Bei si sahihi"));
        }

        let name = input.name.unwrap_or(existing.name);
        if name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Product name is required",
                "Jina la bidhaa linahitajika",
            ));
        }

        let barcode = input.barcode.unwrap_or(existing.barcode);
        if let Some(b) = &barcode {
            if let Err(msg) = validate_barcode(b) {
                return Err(AppError::validation("barcode", msg, "Msimbo si sahihi"));
            }
        }

        let (global_product_id, link_changed) = match input.global_product_id {
            Some(new_link) => {
                if let Some(id) = new_link {
                    let exists = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM global_products WHERE id = $1)",
                    )
                    .bind(id)
                    .fetch_one(&self.db)
                    .await?;

                    if !exists {
                        return Err(AppError::NotFound("Global product".to_string()));
                    }
                }
                (new_link, new_link != existing.global_product_id)
            }
            None => (existing.global_product_id, false),
        };

        let status = match input.status {
            Some(status) => status,
            None if link_changed && global_product_id.is_some() => ProductStatus::Linked,
            None if link_changed => ProductStatus::PendingReview,
            None => existing
                .status
                .parse()
                .map_err(|e: String| AppError::Internal(format!("Corrupt product status: {}", e)))?,
        };

        let quality_type = input
            .quality_type
            .map(|q| q.as_str().to_string())
            .or(existing.quality_type);

        let query = format!(
            r#"
            UPDATE products
            SET global_product_id = $1, name = $2, barcode = $3, description = $4, price = $5,
                quality_type = $6, status = $7, image_ref = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {}
            "#,
            PRODUCT_COLUMNS.replace("p.", "products.")
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(global_product_id)
            .bind(name.trim())
            .bind(barcode)
            .bind(input.description.unwrap_or(existing.description))
            .bind(price)
            .bind(quality_type)
            .bind(status.as_str())
            .bind(input.image_ref.unwrap_or(existing.image_ref))
            .bind(product_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::DuplicateEntry("name".to_string())
                }
                _ => AppError::DatabaseError(e),
            })?;

        Ok(product)
    }

    /// Search a shop's products by partial name or exact barcode
    pub async fn search(&self, actor: &Actor, shop_id: Uuid, query_text: &str) -> AppResult<Vec<Product>> {
        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&shop_id))
        {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        let trimmed = query_text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", trimmed.replace('%', "\\%").replace('_', "\\_"));

        let query = format!(
            r#"
            SELECT {}
            FROM products p
            WHERE p.shop_id = $1 AND (p.name ILIKE $2 OR p.barcode = $3)
            ORDER BY p.name
            LIMIT 50
            "#,
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(shop_id)
            .bind(&pattern)
            .bind(trimmed)
            .fetch_all(&self.db)
            .await?;

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_input_absent_fields_keep_values() {
        let input: UpdateProductInput = serde_json::from_str(r#"{"price": "1200.00"}"#).unwrap();
        assert_eq!(input.barcode, None);
        assert_eq!(input.image_ref, None);
        assert_eq!(input.global_product_id, None);
    }

    #[test]
    fn test_update_input_explicit_null_clears() {
        let input: UpdateProductInput =
            serde_json::from_str(r#"{"barcode": null, "image_ref": null, "global_product_id": null}"#)
                .unwrap();
        assert_eq!(input.barcode, Some(None));
        assert_eq!(input.image_ref, Some(None));
        assert_eq!(input.global_product_id, Some(None));
    }

    #[test]
    fn test_update_input_value_replaces() {
        let input: UpdateProductInput =
            serde_json::from_str(r#"{"barcode": "6161100112237"}"#).unwrap();
        assert_eq!(input.barcode, Some(Some("6161100112237".to_string())));
    }
}

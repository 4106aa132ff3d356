//! Product resolution for ledger entries
//!
//! Entries may reference a product by id or by free text. Free text resolves
//! against the shop's existing products (name first, then barcode) and
//! creates a PENDING_REVIEW product when nothing matches. Resolution runs
//! inside the caller's transaction so a failed entry never leaves a stray
//! product behind.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{ProductStatus, QualityType, QuantityType};

/// How an entry refers to its product
#[derive(Debug, Clone, Deserialize)]
pub struct EntryProductRef {
    pub product_id: Option<Uuid>,
    pub product_name_text: Option<String>,
    pub product_barcode: Option<String>,
    pub product_quantity_type: Option<QuantityType>,
    pub product_quality_type: Option<QualityType>,
    pub image_ref: Option<String>,
}

/// Outcome of resolving an entry's product reference
#[derive(Debug, Clone)]
pub struct ResolvedProduct {
    pub id: Uuid,
    pub name: String,
    pub quantity_type: QuantityType,
    pub price: Decimal,
    pub created: bool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    quantity_type: String,
    price: Decimal,
}

impl EntryProductRef {
    /// Reject ambiguous references before touching the database
    pub fn validate(&self) -> AppResult<()> {
        if self.product_id.is_some()
            && (self.product_name_text.is_some() || self.product_barcode.is_some())
        {
            return Err(AppError::validation(
                "product_id",
                "Provide either product_id or the text identifiers, not both",
                "Taja bidhaa kwa kitambulisho au kwa jina na msimbo, si vyote viwili",
            ));
        }
        if self.product_id.is_none() {
            match &self.product_name_text {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(AppError::validation(
                        "product_name_text",
                        "Product name is required when no product_id is given",
                        "Jina la bidhaa linahitajika",
                    ));
                }
            }
        }
        Ok(())
    }

    /// The quantity type a new product would be created with
    pub fn target_quantity_type(&self) -> QuantityType {
        self.product_quantity_type.unwrap_or_default()
    }
}

fn parse_quantity_type(raw: &str) -> AppResult<QuantityType> {
    raw.parse()
        .map_err(|e: String| AppError::Internal(format!("Corrupt quantity type: {}", e)))
}

/// Resolve an entry's product reference within the shop, creating a
/// PENDING_REVIEW product if nothing matches
///
/// `purchase_price` seeds the price of a newly created product (stock
/// entries carry one; sales and missed sales do not).
pub async fn resolve_product(
    tx: &mut Transaction<'_, Postgres>,
    shop_id: Uuid,
    product_ref: &EntryProductRef,
    purchase_price: Option<Decimal>,
) -> AppResult<ResolvedProduct> {
    product_ref.validate()?;

    // Direct reference by id
    if let Some(product_id) = product_ref.product_id {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, quantity_type, price FROM products WHERE id = $1 AND shop_id = $2",
        )
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::validation(
                "product_id",
                "Product does not belong to the specified shop",
                "Bidhaa haipo kwenye duka lililotajwa",
            )
        })?;

        return Ok(ResolvedProduct {
            id: row.id,
            name: row.name,
            quantity_type: parse_quantity_type(&row.quantity_type)?,
            price: row.price,
            created: false,
        });
    }

    let name = product_ref
        .product_name_text
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();

    // Name match takes precedence over barcode
    let by_name = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, quantity_type, price
        FROM products
        WHERE shop_id = $1 AND LOWER(name) = LOWER($2)
        "#,
    )
    .bind(shop_id)
    .bind(&name)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(row) = by_name {
        return Ok(ResolvedProduct {
            id: row.id,
            name: row.name,
            quantity_type: parse_quantity_type(&row.quantity_type)?,
            price: row.price,
            created: false,
        });
    }

    if let Some(barcode) = &product_ref.product_barcode {
        let by_barcode = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, quantity_type, price FROM products WHERE shop_id = $1 AND barcode = $2",
        )
        .bind(shop_id)
        .bind(barcode)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(row) = by_barcode {
            return Ok(ResolvedProduct {
                id: row.id,
                name: row.name,
                quantity_type: parse_quantity_type(&row.quantity_type)?,
                price: row.price,
                created: false,
            });
        }
    }

    // No match: some shops require a photo before a new product enters
    // the inventory
    let require_image = sqlx::query_scalar::<_, bool>(
        "SELECT require_image_upload FROM shops WHERE id = $1",
    )
    .bind(shop_id)
    .fetch_one(&mut **tx)
    .await?;

    if require_image && product_ref.image_ref.is_none() {
        return Err(AppError::validation(
            "image_ref",
            "An image is required for new products in this shop",
            "Picha inahitajika kwa bidhaa mpya katika duka hili",
        ));
    }

    let quantity_type = product_ref.target_quantity_type();
    let price = purchase_price.unwrap_or(Decimal::ZERO);

    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        INSERT INTO products (shop_id, name, barcode, price, quantity_type, quality_type, status, image_ref)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, name, quantity_type, price
        "#,
    )
    .bind(shop_id)
    .bind(&name)
    .bind(&product_ref.product_barcode)
    .bind(price)
    .bind(quantity_type.as_str())
    .bind(product_ref.product_quality_type.map(|q| q.as_str()))
    .bind(ProductStatus::PendingReview.as_str())
    .bind(&product_ref.image_ref)
    .fetch_one(&mut **tx)
    .await?;

    Ok(ResolvedProduct {
        id: row.id,
        name: row.name,
        quantity_type: parse_quantity_type(&row.quantity_type)?,
        price: row.price,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ref(
        product_id: Option<Uuid>,
        name: Option<&str>,
        quantity_type: Option<QuantityType>,
    ) -> EntryProductRef {
        EntryProductRef {
            product_id,
            product_name_text: name.map(String::from),
            product_barcode: None,
            product_quantity_type: quantity_type,
            product_quality_type: None,
            image_ref: None,
        }
    }

    #[test]
    fn test_both_id_and_text_rejected() {
        let r = make_ref(Some(Uuid::new_v4()), Some("Sukari"), None);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_neither_id_nor_text_rejected() {
        let r = make_ref(None, None, None);
        assert!(r.validate().is_err());

        let blank = make_ref(None, Some("   "), None);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_id_with_barcode_rejected() {
        let mut r = make_ref(Some(Uuid::new_v4()), None, None);
        r.product_barcode = Some("6161100112237".to_string());
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_id_alone_is_fine() {
        let r = make_ref(Some(Uuid::new_v4()), None, None);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_text_alone_is_fine() {
        let r = make_ref(None, Some("Sukari 1kg"), None);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_target_quantity_type_defaults_to_unit() {
        let r = make_ref(None, Some("Sukari"), None);
        assert_eq!(r.target_quantity_type(), QuantityType::Unit);

        let r = make_ref(None, Some("Mchele"), Some(QuantityType::WeightVolume));
        assert_eq!(r.target_quantity_type(), QuantityType::WeightVolume);
    }
}

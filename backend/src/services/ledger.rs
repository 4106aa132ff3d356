//! Append-only inventory ledger service
//!
//! Stock, sale, and missed-sale entries are never updated or deleted;
//! current stock is always derived by folding over the ledger. Sales
//! lock the product row so concurrent sales cannot both pass the
//! stock check.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;
use crate::services::resolution::{resolve_product, EntryProductRef};
use shared::types::QuantityType;
use shared::validation::{is_whole_number, validate_money};

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Stock receipt entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockEntry {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub is_synced: bool,
}

/// Sale entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleEntry {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub selling_price: Decimal,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub is_synced: bool,
}

/// Missed-sale entry (customer asked, shop could not sell)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MissedSaleEntry {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub product_name_text: Option<String>,
    pub quantity_requested: Decimal,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub is_synced: bool,
}

/// Input for recording a stock receipt
#[derive(Debug, Deserialize)]
pub struct RecordStockInput {
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    #[serde(flatten)]
    pub product: EntryProductRef,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    /// Client-side timestamp for offline-recorded entries
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_synced: bool,
}

/// Input for recording a sale
#[derive(Debug, Deserialize)]
pub struct RecordSaleInput {
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    #[serde(flatten)]
    pub product: EntryProductRef,
    pub quantity: Decimal,
    /// Defaults to the product's listed price
    pub selling_price: Option<Decimal>,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_synced: bool,
}

/// Input for recording a missed sale
#[derive(Debug, Deserialize)]
pub struct RecordMissedSaleInput {
    pub shop_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub product_name_text: Option<String>,
    pub quantity_requested: Decimal,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_synced: bool,
}

/// Derived stock level for a product
#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub current_stock: Decimal,
    pub total_stocked: Decimal,
    pub total_sold: Decimal,
}

/// Filters for listing ledger entries
#[derive(Debug, Default, Deserialize)]
pub struct LedgerFilter {
    pub shop_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct StockSums {
    total_in: Decimal,
    total_out: Decimal,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock receipt, resolving the product reference in the
    /// same transaction
    pub async fn record_stock(&self, actor: &Actor, input: RecordStockInput) -> AppResult<StockEntry> {
        if !actor.can_record_for(input.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        Self::check_positive(input.quantity)?;

        if let Some(price) = input.purchase_price {
            if let Err(msg) = validate_money(price) {
                return Err(AppError::validation(
                    "purchase_price",
                    msg,
                    "Bei ya kununulia si sahihi",
                ));
            }
        }

        let worker_id = self
            .resolve_worker_attribution(actor, input.shop_id, input.worker_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let product =
            resolve_product(&mut tx, input.shop_id, &input.product, input.purchase_price).await?;

        Self::check_whole_for_unit(input.quantity, product.quantity_type)?;

        let entry = sqlx::query_as::<_, StockEntry>(
            r#"
            INSERT INTO stock_entries (shop_id, worker_id, product_id, quantity, purchase_price,
                                       notes, recorded_at, is_synced)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), $8)
            RETURNING id, shop_id, worker_id, product_id, quantity, purchase_price, notes,
                      recorded_at, is_synced
            "#,
        )
        .bind(input.shop_id)
        .bind(worker_id)
        .bind(product.id)
        .bind(input.quantity)
        .bind(input.purchase_price)
        .bind(&input.notes)
        .bind(input.recorded_at)
        .bind(input.is_synced)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            shop_id = %input.shop_id,
            product_id = %product.id,
            created = product.created,
            "stock entry recorded"
        );

        Ok(entry)
    }

    /// Record a sale, failing with INSUFFICIENT_STOCK if the ledger does
    /// not cover the quantity
    pub async fn record_sale(&self, actor: &Actor, input: RecordSaleInput) -> AppResult<SaleEntry> {
        if !actor.can_record_for(input.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        Self::check_positive(input.quantity)?;

        if let Some(price) = input.selling_price {
            if let Err(msg) = validate_money(price) {
                return Err(AppError::validation(
                    "selling_price",
                    msg,
                    "Bei ya kuuzia si sahihi",
                ));
            }
        }

        let worker_id = self
            .resolve_worker_attribution(actor, input.shop_id, input.worker_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let product = resolve_product(&mut tx, input.shop_id, &input.product, None).await?;

        Self::check_whole_for_unit(input.quantity, product.quantity_type)?;

        // Lock the product row so concurrent sales serialize on the
        // stock check
        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(product.id)
            .execute(&mut *tx)
            .await?;

        let current = Self::stock_in_tx(&mut tx, product.id).await?;
        if current < input.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Cannot sell {} of {}: only {} in stock",
                input.quantity, product.name, current
            )));
        }

        let selling_price = input.selling_price.unwrap_or(product.price);

        let entry = sqlx::query_as::<_, SaleEntry>(
            r#"
            INSERT INTO sale_entries (shop_id, worker_id, product_id, quantity, selling_price,
                                      notes, recorded_at, is_synced)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), $8)
            RETURNING id, shop_id, worker_id, product_id, quantity, selling_price, notes,
                      recorded_at, is_synced
            "#,
        )
        .bind(input.shop_id)
        .bind(worker_id)
        .bind(product.id)
        .bind(input.quantity)
        .bind(selling_price)
        .bind(&input.notes)
        .bind(input.recorded_at)
        .bind(input.is_synced)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            shop_id = %input.shop_id,
            product_id = %product.id,
            "sale entry recorded"
        );

        Ok(entry)
    }

    /// Record a missed sale
    ///
    /// The product reference is optional here: free text is kept as-is so
    /// demand for products the shop has never carried is still captured.
    pub async fn record_missed_sale(
        &self,
        actor: &Actor,
        input: RecordMissedSaleInput,
    ) -> AppResult<MissedSaleEntry> {
        if !actor.can_record_for(input.shop_id) {
            return Err(AppError::InsufficientPermissions);
        }

        Self::check_positive(input.quantity_requested)?;

        match (&input.product_id, &input.product_name_text) {
            (Some(_), Some(_)) => {
                return Err(AppError::validation(
                    "product_name_text",
                    "Provide either product_id or product_name_text, not both",
                    "Taja bidhaa kwa kitambulisho au jina, si vyote viwili",
                ));
            }
            (None, None) => {
                return Err(AppError::validation(
                    "product_name_text",
                    "Either product_id or product_name_text is required",
                    "Kitambulisho au jina la bidhaa linahitajika",
                ));
            }
            (None, Some(name)) if name.trim().is_empty() => {
                return Err(AppError::validation(
                    "product_name_text",
                    "Product name cannot be blank",
                    "Jina la bidhaa haliwezi kuwa tupu",
                ));
            }
            _ => {}
        }

        let worker_id = self
            .resolve_worker_attribution(actor, input.shop_id, input.worker_id)
            .await?;

        // Free-text missed sales default to UNIT counting
        let quantity_type = match input.product_id {
            Some(product_id) => {
                let raw = sqlx::query_scalar::<_, String>(
                    "SELECT quantity_type FROM products WHERE id = $1 AND shop_id = $2",
                )
                .bind(product_id)
                .bind(input.shop_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| {
                    AppError::validation(
                        "product_id",
                        "Product does not belong to the specified shop",
                        "Bidhaa haipo kwenye duka lililotajwa",
                    )
                })?;
                raw.parse::<QuantityType>()
                    .map_err(|e| AppError::Internal(format!("Corrupt quantity type: {}", e)))?
            }
            None => QuantityType::Unit,
        };

        Self::check_whole_for_unit(input.quantity_requested, quantity_type)?;

        let entry = sqlx::query_as::<_, MissedSaleEntry>(
            r#"
            INSERT INTO missed_sale_entries (shop_id, worker_id, product_id, product_name_text,
                                             quantity_requested, reason, notes, recorded_at, is_synced)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()), $9)
            RETURNING id, shop_id, worker_id, product_id, product_name_text, quantity_requested,
                      reason, notes, recorded_at, is_synced
            "#,
        )
        .bind(input.shop_id)
        .bind(worker_id)
        .bind(input.product_id)
        .bind(input.product_name_text.as_deref().map(str::trim))
        .bind(input.quantity_requested)
        .bind(&input.reason)
        .bind(&input.notes)
        .bind(input.recorded_at)
        .bind(input.is_synced)
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// Derive the current stock level for a product
    pub async fn current_stock(&self, actor: &Actor, product_id: Uuid) -> AppResult<StockLevel> {
        let shop_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT shop_id FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&shop_id))
        {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let sums = sqlx::query_as::<_, StockSums>(
            r#"
            SELECT COALESCE((SELECT SUM(quantity) FROM stock_entries WHERE product_id = $1), 0) AS total_in,
                   COALESCE((SELECT SUM(quantity) FROM sale_entries WHERE product_id = $1), 0) AS total_out
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(StockLevel {
            product_id,
            current_stock: (sums.total_in - sums.total_out).round_dp(3),
            total_stocked: sums.total_in,
            total_sold: sums.total_out,
        })
    }

    /// Get a single stock entry, scoped to the actor
    pub async fn get_stock_entry(&self, actor: &Actor, entry_id: Uuid) -> AppResult<StockEntry> {
        let entry = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, quantity, purchase_price, notes,
                   recorded_at, is_synced
            FROM stock_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock entry".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&entry.shop_id))
        {
            return Err(AppError::NotFound("Stock entry".to_string()));
        }

        Ok(entry)
    }

    /// Get a single sale entry, scoped to the actor
    pub async fn get_sale_entry(&self, actor: &Actor, entry_id: Uuid) -> AppResult<SaleEntry> {
        let entry = sqlx::query_as::<_, SaleEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, quantity, selling_price, notes,
                   recorded_at, is_synced
            FROM sale_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale entry".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&entry.shop_id))
        {
            return Err(AppError::NotFound("Sale entry".to_string()));
        }

        Ok(entry)
    }

    /// Get a single missed-sale entry, scoped to the actor
    pub async fn get_missed_sale(
        &self,
        actor: &Actor,
        entry_id: Uuid,
    ) -> AppResult<MissedSaleEntry> {
        let entry = sqlx::query_as::<_, MissedSaleEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, product_name_text, quantity_requested,
                   reason, notes, recorded_at, is_synced
            FROM missed_sale_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Missed sale entry".to_string()))?;

        if actor
            .visible_shops()
            .is_some_and(|shops| !shops.contains(&entry.shop_id))
        {
            return Err(AppError::NotFound("Missed sale entry".to_string()));
        }

        Ok(entry)
    }

    /// List stock entries visible to the actor, newest first
    pub async fn list_stock_entries(
        &self,
        actor: &Actor,
        filter: LedgerFilter,
    ) -> AppResult<Vec<StockEntry>> {
        let visible = actor.visible_shops();

        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, quantity, purchase_price, notes,
                   recorded_at, is_synced
            FROM stock_entries
            WHERE ($1::uuid[] IS NULL OR shop_id = ANY($1))
              AND ($2::uuid IS NULL OR shop_id = $2)
              AND ($3::uuid IS NULL OR product_id = $3)
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(visible)
        .bind(filter.shop_id)
        .bind(filter.product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// List sale entries visible to the actor, newest first
    pub async fn list_sale_entries(
        &self,
        actor: &Actor,
        filter: LedgerFilter,
    ) -> AppResult<Vec<SaleEntry>> {
        let visible = actor.visible_shops();

        let entries = sqlx::query_as::<_, SaleEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, quantity, selling_price, notes,
                   recorded_at, is_synced
            FROM sale_entries
            WHERE ($1::uuid[] IS NULL OR shop_id = ANY($1))
              AND ($2::uuid IS NULL OR shop_id = $2)
              AND ($3::uuid IS NULL OR product_id = $3)
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(visible)
        .bind(filter.shop_id)
        .bind(filter.product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// List missed-sale entries visible to the actor, newest first
    pub async fn list_missed_sales(
        &self,
        actor: &Actor,
        filter: LedgerFilter,
    ) -> AppResult<Vec<MissedSaleEntry>> {
        let visible = actor.visible_shops();

        let entries = sqlx::query_as::<_, MissedSaleEntry>(
            r#"
            SELECT id, shop_id, worker_id, product_id, product_name_text, quantity_requested,
                   reason, notes, recorded_at, is_synced
            FROM missed_sale_entries
            WHERE ($1::uuid[] IS NULL OR shop_id = ANY($1))
              AND ($2::uuid IS NULL OR shop_id = $2)
              AND ($3::uuid IS NULL OR product_id = $3)
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(visible)
        .bind(filter.shop_id)
        .bind(filter.product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Validate the worker a ledger entry is attributed to
    ///
    /// Workers always record as themselves; managers may attribute an
    /// entry to any worker of the target shop.
    async fn resolve_worker_attribution(
        &self,
        actor: &Actor,
        shop_id: Uuid,
        requested: Option<Uuid>,
    ) -> AppResult<Option<Uuid>> {
        if let Some(own_id) = actor.worker_id() {
            return Ok(Some(own_id));
        }

        let Some(worker_id) = requested else {
            return Ok(None);
        };

        let belongs = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM workers WHERE id = $1 AND shop_id = $2)",
        )
        .bind(worker_id)
        .bind(shop_id)
        .fetch_one(&self.db)
        .await?;

        if !belongs {
            return Err(AppError::validation(
                "worker_id",
                "Worker does not belong to the specified shop",
                "Mfanyakazi hayupo kwenye duka lililotajwa",
            ));
        }

        Ok(Some(worker_id))
    }

    async fn stock_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
    ) -> AppResult<Decimal> {
        let sums = sqlx::query_as::<_, StockSums>(
            r#"
            SELECT COALESCE((SELECT SUM(quantity) FROM stock_entries WHERE product_id = $1), 0) AS total_in,
                   COALESCE((SELECT SUM(quantity) FROM sale_entries WHERE product_id = $1), 0) AS total_out
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok((sums.total_in - sums.total_out).round_dp(3))
    }

    fn check_positive(quantity: Decimal) -> AppResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(
                "quantity",
                "Quantity must be greater than zero",
                "Idadi lazima iwe zaidi ya sifuri",
            ));
        }
        Ok(())
    }

    fn check_whole_for_unit(quantity: Decimal, quantity_type: QuantityType) -> AppResult<()> {
        if quantity_type == QuantityType::Unit && !is_whole_number(quantity) {
            return Err(AppError::validation(
                "quantity",
                "Quantity must be a whole number for UNIT type products",
                "Idadi lazima iwe namba kamili kwa bidhaa za aina ya UNIT",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_check_positive() {
        assert!(LedgerService::check_positive(dec("0.001")).is_ok());
        assert!(LedgerService::check_positive(dec("0")).is_err());
        assert!(LedgerService::check_positive(dec("-5")).is_err());
    }

    #[test]
    fn test_whole_number_gate_applies_to_unit_only() {
        assert!(LedgerService::check_whole_for_unit(dec("3"), QuantityType::Unit).is_ok());
        assert!(LedgerService::check_whole_for_unit(dec("3.000"), QuantityType::Unit).is_ok());
        assert!(LedgerService::check_whole_for_unit(dec("3.5"), QuantityType::Unit).is_err());
        assert!(
            LedgerService::check_whole_for_unit(dec("3.5"), QuantityType::WeightVolume).is_ok()
        );
    }
}

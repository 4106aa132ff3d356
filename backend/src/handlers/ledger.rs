//! HTTP handlers for the inventory ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::ledger::{
    LedgerFilter, LedgerService, MissedSaleEntry, RecordMissedSaleInput, RecordSaleInput,
    RecordStockInput, SaleEntry, StockEntry, StockLevel,
};
use crate::AppState;

/// Record a stock receipt
pub async fn record_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RecordStockInput>,
) -> AppResult<Json<StockEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.record_stock(&actor, input).await?;
    Ok(Json(entry))
}

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<Json<SaleEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.record_sale(&actor, input).await?;
    Ok(Json(entry))
}

/// Record a missed sale
pub async fn record_missed_sale(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RecordMissedSaleInput>,
) -> AppResult<Json<MissedSaleEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.record_missed_sale(&actor, input).await?;
    Ok(Json(entry))
}

/// List stock entries
pub async fn list_stock_entries(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Vec<StockEntry>>> {
    let service = LedgerService::new(state.db);
    let entries = service.list_stock_entries(&actor, filter).await?;
    Ok(Json(entries))
}

/// List sale entries
pub async fn list_sale_entries(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Vec<SaleEntry>>> {
    let service = LedgerService::new(state.db);
    let entries = service.list_sale_entries(&actor, filter).await?;
    Ok(Json(entries))
}

/// List missed-sale entries
pub async fn list_missed_sales(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Vec<MissedSaleEntry>>> {
    let service = LedgerService::new(state.db);
    let entries = service.list_missed_sales(&actor, filter).await?;
    Ok(Json(entries))
}

/// Get a stock entry
pub async fn get_stock_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<StockEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.get_stock_entry(&actor, entry_id).await?;
    Ok(Json(entry))
}

/// Get a sale entry
pub async fn get_sale_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<SaleEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.get_sale_entry(&actor, entry_id).await?;
    Ok(Json(entry))
}

/// Get a missed-sale entry
pub async fn get_missed_sale(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<MissedSaleEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.get_missed_sale(&actor, entry_id).await?;
    Ok(Json(entry))
}

/// Get the current stock level for a product
pub async fn current_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<StockLevel>> {
    let service = LedgerService::new(state.db);
    let level = service.current_stock(&actor, product_id).await?;
    Ok(Json(level))
}

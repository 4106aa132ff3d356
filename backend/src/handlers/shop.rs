//! HTTP handlers for shop management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::shop::{
    CategorySummary, CreateShopCategoryInput, CreateShopInput, Shop, ShopCategory, ShopService,
    UpdateShopInput,
};
use crate::AppState;

/// Create a shop
pub async fn create_shop(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateShopInput>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.create_shop(&actor, input).await?;
    Ok(Json(shop))
}

/// List shops visible to the caller
pub async fn list_shops(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<Vec<Shop>>> {
    let service = ShopService::new(state.db);
    let shops = service.list_shops(&actor).await?;
    Ok(Json(shops))
}

/// Get a shop
pub async fn get_shop(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.get_shop(&actor, shop_id).await?;
    Ok(Json(shop))
}

/// Update a shop
pub async fn update_shop(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(shop_id): Path<Uuid>,
    Json(input): Json<UpdateShopInput>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.update_shop(&actor, shop_id, input).await?;
    Ok(Json(shop))
}

#[derive(Deserialize)]
pub struct AddManagerInput {
    pub user_id: Uuid,
}

/// Assign another manager to a shop
pub async fn add_manager(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(shop_id): Path<Uuid>,
    Json(input): Json<AddManagerInput>,
) -> AppResult<Json<Value>> {
    let service = ShopService::new(state.db);
    service.add_manager(&actor, shop_id, input.user_id).await?;
    Ok(Json(json!({ "added": true })))
}

/// Product counts per catalog category for a shop
pub async fn categories_summary(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<Vec<CategorySummary>>> {
    let service = ShopService::new(state.db);
    let summary = service.categories_summary(&actor, shop_id).await?;
    Ok(Json(summary))
}

/// Create a shop classification tag
pub async fn create_shop_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateShopCategoryInput>,
) -> AppResult<Json<ShopCategory>> {
    let service = ShopService::new(state.db);
    let category = service.create_shop_category(&actor, input).await?;
    Ok(Json(category))
}

/// List shop classification tags
pub async fn list_shop_categories(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
) -> AppResult<Json<Vec<ShopCategory>>> {
    let service = ShopService::new(state.db);
    let categories = service.list_shop_categories().await?;
    Ok(Json(categories))
}

//! HTTP handlers for the global product catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::catalog::{
    CatalogService, Category, CreateCategoryInput, CreateGlobalProductInput, GlobalProduct,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GlobalProductListQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Create a catalog category
pub async fn create_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.create_category(&actor, input).await?;
    Ok(Json(category))
}

/// List catalog categories
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Create a global product
pub async fn create_global_product(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateGlobalProductInput>,
) -> AppResult<Json<GlobalProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.create_global_product(&actor, input).await?;
    Ok(Json(product))
}

/// List global products
pub async fn list_global_products(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<GlobalProductListQuery>,
) -> AppResult<Json<Vec<GlobalProduct>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_global_products(query.category_id).await?;
    Ok(Json(products))
}

/// Get a global product
pub async fn get_global_product(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(global_product_id): Path<Uuid>,
) -> AppResult<Json<GlobalProduct>> {
    let service = CatalogService::new(state.db);
    let product = service.get_global_product(global_product_id).await?;
    Ok(Json(product))
}

/// Search the catalog by name or barcode
pub async fn search_catalog(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<GlobalProduct>>> {
    let service = CatalogService::new(state.db);
    let products = service.search(&query.q).await?;
    Ok(Json(products))
}

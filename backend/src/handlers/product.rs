//! HTTP handlers for shop product endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::product::{
    CreateProductInput, Product, ProductService, UpdateProductInput,
};
use crate::AppState;
use shared::types::ProductStatus;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub shop_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSearchQuery {
    pub shop_id: Uuid,
    pub q: String,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.create_product(&actor, input).await?;
    Ok(Json(product))
}

/// List products visible to the caller
pub async fn list_products(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service
        .list_products(&actor, query.shop_id, query.status)
        .await?;
    Ok(Json(products))
}

/// Get a product with its derived stock level
pub async fn get_product(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get_product(&actor, product_id).await?;
    Ok(Json(product))
}

/// Update a product (review, relink, reprice)
pub async fn update_product(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.update_product(&actor, product_id, input).await?;
    Ok(Json(product))
}

/// Search a shop's products by name or barcode
pub async fn search_products(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ProductSearchQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.search(&actor, query.shop_id, &query.q).await?;
    Ok(Json(products))
}

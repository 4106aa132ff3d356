//! Route definitions for the Dukani inventory platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login endpoints are public)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - shop management
        .nest("/shops", shop_routes(state.clone()))
        // Protected routes - worker management
        .nest("/workers", worker_routes(state.clone()))
        // Protected routes - global catalog
        .nest("/catalog", catalog_routes(state.clone()))
        // Protected routes - shop products
        .nest("/products", product_routes(state.clone()))
        // Protected routes - inventory ledger
        .nest("/ledger", ledger_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/register", post(handlers::register))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/worker-login", post(handlers::worker_login))
        .merge(protected)
}

/// Shop management routes (protected)
fn shop_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_shops).post(handlers::create_shop))
        .route("/:shop_id", get(handlers::get_shop).put(handlers::update_shop))
        .route("/:shop_id/managers", post(handlers::add_manager))
        .route("/:shop_id/categories-summary", get(handlers::categories_summary))
        .route(
            "/categories",
            get(handlers::list_shop_categories).post(handlers::create_shop_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Worker management routes (protected)
fn worker_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_workers).post(handlers::create_worker))
        .route(
            "/:worker_id",
            get(handlers::get_worker)
                .put(handlers::update_worker)
                .delete(handlers::delete_worker),
        )
        .route(
            "/:worker_id/invite",
            get(handlers::get_invite).post(handlers::create_invite),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Global catalog routes (protected)
fn catalog_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(handlers::list_global_products).post(handlers::create_global_product),
        )
        .route("/products/search", get(handlers::search_catalog))
        .route("/products/:global_product_id", get(handlers::get_global_product))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Shop product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/search", get(handlers::search_products))
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route("/:product_id/stock", get(handlers::current_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory ledger routes (protected)
fn ledger_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/stock-entries",
            get(handlers::list_stock_entries).post(handlers::record_stock),
        )
        .route(
            "/sale-entries",
            get(handlers::list_sale_entries).post(handlers::record_sale),
        )
        .route(
            "/missed-sales",
            get(handlers::list_missed_sales).post(handlers::record_missed_sale),
        )
        .route("/stock-entries/:entry_id", get(handlers::get_stock_entry))
        .route("/sale-entries/:entry_id", get(handlers::get_sale_entry))
        .route("/missed-sales/:entry_id", get(handlers::get_missed_sale))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

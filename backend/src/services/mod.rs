//! Business logic services
//!
//! Each service owns a database pool handle and exposes async operations
//! used by the HTTP handlers.

pub mod auth;
pub mod catalog;
pub mod ledger;
pub mod product;
pub mod resolution;
pub mod shop;
pub mod worker;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use ledger::LedgerService;
pub use product::ProductService;
pub use shop::ShopService;
pub use worker::WorkerService;

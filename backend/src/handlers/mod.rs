//! HTTP handlers

pub mod auth;
pub mod catalog;
pub mod health;
pub mod ledger;
pub mod product;
pub mod shop;
pub mod worker;

pub use auth::*;
pub use catalog::*;
pub use health::*;
pub use ledger::*;
pub use product::*;
pub use shop::*;
pub use worker::*;

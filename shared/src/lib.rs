//! Shared types for the Dukani inventory ledger
//!
//! This crate contains the domain enums and validation rules shared between
//! the backend and the mobile/field clients that submit ledger entries.

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;

//! Shared types and models for the Rubber Group Operations Platform
//!
//! This crate contains the domain types and pure ledger logic shared between
//! the backend services and their test suites.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;

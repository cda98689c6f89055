//! Tindahan ni Lola Core - Domain types and store logic.
//!
//! This crate provides the types and pure logic used by the storefront:
//! - `storefront` - Server-rendered store management UI
//! - `integration-tests` - End-to-end HTTP tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sessions. Every operation here is a single synchronous pass
//! over values handed in by the caller, which keeps it trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, categories and statuses
//! - [`product`] - Product records and the product form
//! - [`liability`] - Liability (debt) records and the liability form
//! - [`cart`] - Session cart aggregation
//! - [`ledger`] - Grouping and totalling liabilities by debtor
//! - [`catalog`] - Catalog search, category filter and sorting
//! - [`receipt`] - Printable receipt formatting
//! - [`auth`] - Login and registration form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod ledger;
pub mod liability;
pub mod product;
pub mod receipt;
mod serde_lenient;
pub mod types;

pub use types::*;

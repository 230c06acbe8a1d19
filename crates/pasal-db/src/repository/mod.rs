//! # Repository Module
//!
//! Database repositories for Pasal POS.
//!
//! ```text
//! CLI command
//!      │  db.products().resolve_sku("WAIWAI-75")
//!      ▼
//! ProductRepository / SaleRepository / KhataRepository
//!      │  SQL (runtime-checked sqlx queries)
//!      ▼
//! SQLite
//! ```
//!
//! Each repository owns a clone of the pool; get one from
//! [`Database`](crate::Database) rather than constructing it directly.
//!
//! - [`ProductRepository`](product::ProductRepository) - catalogue, variants, stock
//! - [`SaleRepository`](sale::SaleRepository) - atomic checkout, voids, daily report
//! - [`KhataRepository`](khata::KhataRepository) - customers and credit ledger

pub mod khata;
pub mod product;
pub mod sale;

//! # inventory-db: Database Layer for the Inventory Store
//!
//! SQLite storage for products, using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller (CLI, HTTP handler, tests)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   inventory-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ ProductStore  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ (product.rs)  │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (products table)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The product store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inventory_db::{Database, DbConfig, InventoryUpdates};
//!
//! let db = Database::new(DbConfig::new("inventory.db")).await?;
//!
//! let tools = db.products().list_products("tools").await?;
//! db.products()
//!     .batch_update_inventory(&InventoryUpdates::from([(1, 3), (2, 0)]))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::product::ProductStore;

pub use inventory_core::{InventoryUpdates, Product, ProductId, PRODUCTS_TABLE};

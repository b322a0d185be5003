//! # inventory-core: Pure Domain Types for the Inventory Store
//!
//! This crate holds the types every layer of the inventory store agrees on.
//! It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Store Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External callers (CLI, HTTP, tests)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ inventory-core (THIS CRATE) ★                     │   │
//! │  │      Product • ProductId • InventoryUpdates • PRODUCTS_TABLE    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 inventory-db (Database Layer)                   │   │
//! │  │            ProductStore, migrations, connection pool            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use inventory_core::Product;
//!
//! let widget = Product::new("Widget", 9.99, 10, "tools");
//! assert!(!widget.is_persisted());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the table holding product rows.
///
/// Fixed for the whole process; no operation takes a table name as input.
pub const PRODUCTS_TABLE: &str = "products";

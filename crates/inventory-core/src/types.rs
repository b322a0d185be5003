//! # Domain Types
//!
//! The single persisted entity of the inventory store and the shapes used to
//! talk about it.
//!
//! ## Product Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Product Lifecycle                                │
//! │                                                                         │
//! │  Product::new(..)            id = 0 (not persisted)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_product(&mut p)      id assigned in place (1, 2, 3, ...)       │
//! │       │                                                                 │
//! │       ├──► get_product(id)       read back                             │
//! │       ├──► update_product(&p)    all fields except id overwritten      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  delete_product(id)          id invalid from here on                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a product is created.
pub type ProductId = i64;

/// New stock levels keyed by product id, applied as one atomic batch.
///
/// Iteration order is unspecified; callers must not rely on it.
pub type InventoryUpdates = HashMap<ProductId, i64>;

/// An inventory item.
///
/// Column order in storage is `id, name, price, quantity, category`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Store-assigned identifier. `0` until the product is created.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: f64,

    /// Stock count. Negative values are accepted as-is.
    pub quantity: i64,

    /// Category used for filtered listing.
    pub category: String,
}

impl Product {
    /// Creates an unpersisted product (id 0).
    pub fn new(
        name: impl Into<String>,
        price: f64,
        quantity: i64,
        category: impl Into<String>,
    ) -> Self {
        Product {
            id: 0,
            name: name.into(),
            price,
            quantity,
            category: category.into(),
        }
    }

    /// Returns true once the store has assigned an id.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

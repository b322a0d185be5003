//! # Repository Module
//!
//! Database access for the inventory store.
//!
//! ## Store Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.products().get_product(1)                                  │
//! │       ▼                                                                 │
//! │  ProductStore                                                          │
//! │  ├── create_product(&mut product)                                      │
//! │  ├── get_product(id)                                                   │
//! │  ├── update_product(&product)                                          │
//! │  ├── delete_product(id)                                                │
//! │  ├── list_products(category)                                           │
//! │  └── batch_update_inventory(&updates)                                  │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`ProductStore`](product::ProductStore) - Product CRUD and batch inventory updates

pub mod product;

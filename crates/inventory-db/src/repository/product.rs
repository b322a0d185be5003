//! # Product Store
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations guarded by an existence check
//! - Category-filtered listing
//! - All-or-nothing batch quantity updates
//!
//! ## Existence Guard
//! Update and delete read the row first and only write when it exists.
//! A zero affected-row count can't tell "missing" from "no-op", so the
//! guard is an explicit SELECT instead.
//!
//! ## Batch Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 batch_update_inventory({1: 3, 2: 0})                    │
//! │                                                                         │
//! │  BEGIN ─────────────────────────────────────────── Begin error         │
//! │    │                                                                    │
//! │    ├── SELECT id = 1  ✓   UPDATE quantity = 3  ✓                       │
//! │    ├── SELECT id = 2  ✓   UPDATE quantity = 0  ✓                       │
//! │    │        │                    │                                      │
//! │    │        ✗ BatchGet           ✗ BatchUpdate                          │
//! │    │        └─────────┬──────────┘                                      │
//! │    │                  ▼                                                 │
//! │    │             ROLLBACK ───────────────────────── Rollback error     │
//! │    ▼                                                                    │
//! │  COMMIT ────────────────────────────────────────── Commit error        │
//! │                                                                         │
//! │  No partial commit is reachable: either every quantity lands or none.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pairs are visited in `HashMap` order, which is unspecified. Order only
//! decides which failing id gets reported.

use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use inventory_core::{InventoryUpdates, Product, ProductId, PRODUCTS_TABLE};

/// Store for product rows.
///
/// ## Usage
/// ```rust,ignore
/// let store = ProductStore::new(pool);
///
/// let mut widget = Product::new("Widget", 9.99, 10, "tools");
/// store.create_product(&mut widget).await?;
///
/// let updates = InventoryUpdates::from([(widget.id, 3)]);
/// store.batch_update_inventory(&updates).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    /// Creates a store over an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        ProductStore { pool }
    }

    /// Inserts a new product and writes the assigned id back into `product`.
    ///
    /// Any id already on `product` is ignored.
    ///
    /// ## Returns
    /// * `Err(DbError::Insert)` - INSERT failed
    /// * `Err(DbError::IdentityRetrieval)` - inserted, but the id couldn't be read
    pub async fn create_product(&self, product: &mut Product) -> DbResult<()> {
        debug!(name = %product.name, category = %product.category, "Inserting product");

        let sql = format!(
            "INSERT INTO {PRODUCTS_TABLE} (name, price, quantity, category) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id"
        );

        let row = sqlx::query(&sql)
            .bind(product.name.as_str())
            .bind(product.price)
            .bind(product.quantity)
            .bind(product.category.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::Insert)?;

        product.id = row.try_get("id").map_err(DbError::IdentityRetrieval)?;

        debug!(id = product.id, "Product inserted");
        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product found
    /// * `Err(DbError::NotFound)` - No row with that id
    /// * `Err(DbError::Query)` - Any other storage fault
    pub async fn get_product(&self, id: ProductId) -> DbResult<Product> {
        fetch_product(&self.pool, id).await
    }

    /// Overwrites name, price, quantity and category of an existing product.
    ///
    /// The guard's `NotFound`/`Query` error is returned unchanged and no
    /// write is attempted.
    pub async fn update_product(&self, product: &Product) -> DbResult<()> {
        self.get_product(product.id).await?;

        debug!(id = product.id, "Updating product");

        let sql = format!(
            "UPDATE {PRODUCTS_TABLE} SET name = ?1, price = ?2, quantity = ?3, category = ?4 \
             WHERE id = ?5"
        );

        sqlx::query(&sql)
            .bind(product.name.as_str())
            .bind(product.price)
            .bind(product.quantity)
            .bind(product.category.as_str())
            .bind(product.id)
            .execute(&self.pool)
            .await
            .map_err(|source| DbError::Update {
                id: product.id,
                source,
            })?;

        Ok(())
    }

    /// Removes an existing product. Its id is invalid afterwards.
    pub async fn delete_product(&self, id: ProductId) -> DbResult<()> {
        self.get_product(id).await?;

        debug!(id, "Deleting product");

        let sql = format!("DELETE FROM {PRODUCTS_TABLE} WHERE id = ?1");

        sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| DbError::Delete { id, source })?;

        Ok(())
    }

    /// Lists products, optionally restricted to one category.
    ///
    /// An empty `category` means no filter. Rows come back in storage order,
    /// which is unspecified. No rows is `Ok(vec![])`.
    pub async fn list_products(&self, category: &str) -> DbResult<Vec<Product>> {
        debug!(category = %category, "Listing products");

        let mut sql = format!("SELECT id, name, price, quantity, category FROM {PRODUCTS_TABLE}");
        if !category.is_empty() {
            sql.push_str(" WHERE category = ?1");
        }

        let mut query = sqlx::query_as::<_, Product>(&sql);
        if !category.is_empty() {
            query = query.bind(category);
        }

        let products = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::query(format!("list products (category '{category}')"), e))?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Sets new quantities for several products in one transaction.
    ///
    /// Either every listed product gets its new quantity or none does.
    ///
    /// ## Returns
    /// * `Err(DbError::Begin)` - transaction could not start
    /// * `Err(DbError::BatchGet)` - an id doesn't exist; rolled back
    /// * `Err(DbError::BatchUpdate)` - a write failed; rolled back
    /// * `Err(DbError::Rollback)` - rolling back failed; state unknown
    /// * `Err(DbError::Commit)` - commit failed; outcome unknown
    pub async fn batch_update_inventory(&self, updates: &InventoryUpdates) -> DbResult<()> {
        debug!(count = updates.len(), "Starting batch inventory update");

        let mut tx = self.pool.begin().await.map_err(DbError::Begin)?;

        for (&id, &quantity) in updates {
            if let Err(cause) = stage_quantity(&mut *tx, id, quantity).await {
                warn!(id, error = %cause, "Batch inventory update failed, rolling back");

                return Err(match tx.rollback().await {
                    Ok(()) => cause,
                    Err(source) => DbError::Rollback {
                        cause: Box::new(cause),
                        source,
                    },
                });
            }
        }

        tx.commit().await.map_err(DbError::Commit)?;

        info!(count = updates.len(), "Batch inventory update committed");
        Ok(())
    }

    /// Counts all products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {PRODUCTS_TABLE}");

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::query("count products", e))?;

        Ok(count)
    }
}

/// Reads one product through any executor (pool or open transaction).
async fn fetch_product<'e, E>(executor: E, id: ProductId) -> DbResult<Product>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT id, name, price, quantity, category FROM {PRODUCTS_TABLE} WHERE id = ?1");

    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| DbError::query(format!("get product {id}"), e))?
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Guarded quantity write for one batch pair, on the transaction's connection.
///
/// The check runs on the same connection as the write so it sees the
/// transaction's view of the table.
async fn stage_quantity(conn: &mut SqliteConnection, id: ProductId, quantity: i64) -> DbResult<()> {
    fetch_product(&mut *conn, id)
        .await
        .map_err(|e| DbError::BatchGet {
            id,
            source: Box::new(e),
        })?;

    let sql = format!("UPDATE {PRODUCTS_TABLE} SET quantity = ?1 WHERE id = ?2");

    sqlx::query(&sql)
        .bind(quantity)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|source| DbError::BatchUpdate { id, source })?;

    debug!(id, quantity, "Quantity staged");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> (Database, ProductStore) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.products();
        (db, store)
    }

    async fn create(store: &ProductStore, name: &str, price: f64, qty: i64, cat: &str) -> Product {
        let mut product = Product::new(name, price, qty, cat);
        store.create_product(&mut product).await.unwrap();
        product
    }

    /// Installs a trigger that aborts any statement of `event` on products.
    async fn reject(db: &Database, name: &str, event: &str) {
        let sql = format!(
            "CREATE TRIGGER {name} BEFORE {event} ON products \
             BEGIN SELECT RAISE(ABORT, '{name}'); END"
        );
        sqlx::query(&sql).execute(db.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_round_trips() {
        let (_db, store) = setup().await;

        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        assert!(widget.is_persisted());

        let fetched = store.get_product(widget.id).await.unwrap();
        assert_eq!(fetched, widget);
        assert_eq!(fetched.price, 9.99);
    }

    #[tokio::test]
    async fn test_create_ignores_caller_id() {
        let (_db, store) = setup().await;

        let mut product = Product::new("Widget", 1.0, 1, "tools");
        product.id = 500;
        store.create_product(&mut product).await.unwrap();

        assert_eq!(product.id, 1);
        assert!(store.get_product(500).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_insert_failure() {
        let (db, store) = setup().await;
        reject(&db, "no_insert", "INSERT").await;

        let mut product = Product::new("Widget", 1.0, 1, "tools");
        let err = store.create_product(&mut product).await.unwrap_err();

        assert!(matches!(err, DbError::Insert(_)));
        assert_eq!(product.id, 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_db, store) = setup().await;

        let err = store.get_product(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(err.to_string(), "Product not found: 42");
    }

    #[tokio::test]
    async fn test_get_on_closed_pool_is_query_error() {
        let (db, store) = setup().await;
        db.close().await;

        let err = store.get_product(1).await.unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let (_db, store) = setup().await;
        let mut widget = create(&store, "Widget", 9.99, 10, "tools").await;

        widget.name = "Widget Pro".to_string();
        widget.price = 14.5;
        widget.quantity = 7;
        widget.category = "hardware".to_string();
        store.update_product(&widget).await.unwrap();

        assert_eq!(store.get_product(widget.id).await.unwrap(), widget);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found_and_writes_nothing() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        let ghost = Product {
            id: 99,
            ..Product::new("Ghost", 1.0, 1, "tools")
        };
        let err = store.update_product(&ghost).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get_product(widget.id).await.unwrap(), widget);
    }

    #[tokio::test]
    async fn test_update_write_failure() {
        let (db, store) = setup().await;
        let mut widget = create(&store, "Widget", 9.99, 10, "tools").await;
        reject(&db, "no_update", "UPDATE").await;

        widget.quantity = 1;
        let err = store.update_product(&widget).await.unwrap_err();

        assert!(matches!(err, DbError::Update { id, .. } if id == widget.id));
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        store.delete_product(widget.id).await.unwrap();

        assert!(store.get_product(widget.id).await.unwrap_err().is_not_found());
        assert!(store.delete_product(widget.id).await.unwrap_err().is_not_found());
        assert!(store.update_product(&widget).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_rows() {
        let (_db, store) = setup().await;
        create(&store, "Widget", 9.99, 10, "tools").await;

        let err = store.delete_product(7).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_write_failure() {
        let (db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        reject(&db, "no_delete", "DELETE").await;

        let err = store.delete_product(widget.id).await.unwrap_err();

        assert!(matches!(err, DbError::Delete { .. }));
        assert!(store.get_product(widget.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        let apple = create(&store, "Apple", 0.5, 100, "produce").await;
        let gadget = create(&store, "Gadget", 19.99, 5, "tools").await;

        let all = store.list_products("").await.unwrap();
        assert_eq!(all.len(), 3);

        let mut tools = store.list_products("tools").await.unwrap();
        tools.sort_by_key(|p| p.id);
        assert_eq!(tools, vec![widget, gadget]);

        assert_eq!(store.list_products("produce").await.unwrap(), vec![apple]);
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let (_db, store) = setup().await;

        assert!(store.list_products("").await.unwrap().is_empty());

        create(&store, "Widget", 9.99, 10, "tools").await;
        assert!(store.list_products("toys").await.unwrap().is_empty());
        // Category match is exact
        assert!(store.list_products("Tools").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_updates_only_quantity() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        let gadget = create(&store, "Gadget", 19.99, 5, "tools").await;
        let apple = create(&store, "Apple", 0.5, 100, "produce").await;

        let updates = InventoryUpdates::from([(widget.id, 3), (gadget.id, -2)]);
        store.batch_update_inventory(&updates).await.unwrap();

        let fetched = store.get_product(widget.id).await.unwrap();
        assert_eq!(fetched, Product { quantity: 3, ..widget });

        let fetched = store.get_product(gadget.id).await.unwrap();
        assert_eq!(fetched, Product { quantity: -2, ..gadget });

        assert_eq!(store.get_product(apple.id).await.unwrap(), apple);
    }

    #[tokio::test]
    async fn test_batch_missing_id_rolls_back() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        let updates = InventoryUpdates::from([(widget.id, 1), (404, 2)]);
        let err = store.batch_update_inventory(&updates).await.unwrap_err();

        assert!(matches!(err, DbError::BatchGet { id: 404, .. }));
        assert!(err.is_not_found());
        assert!(!err.is_state_unknown());
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_batch_write_failure_rolls_back() {
        let (db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        let gadget = create(&store, "Gadget", 19.99, 5, "tools").await;

        // Only the gadget row refuses the write
        let sql = format!(
            "CREATE TRIGGER no_gadget_update BEFORE UPDATE ON products \
             WHEN OLD.id = {} BEGIN SELECT RAISE(ABORT, 'locked'); END",
            gadget.id
        );
        sqlx::query(&sql).execute(db.pool()).await.unwrap();

        let updates = InventoryUpdates::from([(widget.id, 0), (gadget.id, 0)]);
        let err = store.batch_update_inventory(&updates).await.unwrap_err();

        assert!(matches!(err, DbError::BatchUpdate { id, .. } if id == gadget.id));
        assert!(!err.is_not_found());
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);
        assert_eq!(store.get_product(gadget.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_batch_empty_commits() {
        let (_db, store) = setup().await;

        store
            .batch_update_inventory(&InventoryUpdates::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_batch_on_closed_pool_is_begin_error() {
        let (db, store) = setup().await;
        db.close().await;

        let updates = InventoryUpdates::from([(1, 1)]);
        let err = store.batch_update_inventory(&updates).await.unwrap_err();

        assert!(matches!(err, DbError::Begin(_)));
    }

    #[tokio::test]
    async fn test_store_usable_after_failed_batch() {
        let (_db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        let failing = InventoryUpdates::from([(widget.id, 1), (77, 1)]);
        assert!(store.batch_update_inventory(&failing).await.is_err());

        let ok = InventoryUpdates::from([(widget.id, 4)]);
        store.batch_update_inventory(&ok).await.unwrap();
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_batch_commit_failure_is_state_unknown() {
        let (db, store) = setup().await;
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        // Deferred FK violation only surfaces at COMMIT
        for sql in [
            "CREATE TABLE parent (id INTEGER PRIMARY KEY)",
            "CREATE TABLE child (parent_id INTEGER REFERENCES parent(id) \
             DEFERRABLE INITIALLY DEFERRED)",
            "CREATE TRIGGER orphan_child AFTER UPDATE ON products \
             BEGIN INSERT INTO child (parent_id) VALUES (999); END",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }

        let updates = InventoryUpdates::from([(widget.id, 3)]);
        let err = store.batch_update_inventory(&updates).await.unwrap_err();

        assert!(matches!(err, DbError::Commit(_)));
        assert!(err.is_state_unknown());
        assert!(!err.is_not_found());
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_batch_rollback_after_engine_abort() {
        let path = std::env::temp_dir().join(format!(
            "inventory-rollback-{}.db",
            std::process::id()
        ));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let store = db.products();
        let widget = create(&store, "Widget", 9.99, 10, "tools").await;

        // RAISE(ROLLBACK) ends the transaction inside SQLite before the store
        // issues its own ROLLBACK
        sqlx::query(
            "CREATE TRIGGER engine_rollback BEFORE UPDATE ON products \
             BEGIN SELECT RAISE(ROLLBACK, 'engine rollback'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let updates = InventoryUpdates::from([(widget.id, 3)]);
        let err = store.batch_update_inventory(&updates).await.unwrap_err();

        match &err {
            DbError::Rollback { cause, .. } => {
                assert!(err.is_state_unknown());
                assert!(matches!(**cause, DbError::BatchUpdate { id, .. } if id == widget.id));
            }
            other => assert!(
                matches!(other, DbError::BatchUpdate { id, .. } if *id == widget.id),
                "unexpected error: {other:?}"
            ),
        }
        assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test]
    async fn test_inventory_scenario() {
        let (_db, store) = setup().await;

        let widget = create(&store, "Widget", 9.99, 10, "tools").await;
        let gadget = create(&store, "Gadget", 19.99, 5, "tools").await;
        assert_eq!(widget.id, 1);
        assert_eq!(gadget.id, 2);

        let mut ids: Vec<_> = store
            .list_products("tools")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);

        store
            .batch_update_inventory(&InventoryUpdates::from([(1, 3), (2, 0)]))
            .await
            .unwrap();
        assert_eq!(store.get_product(1).await.unwrap().quantity, 3);
        assert_eq!(store.get_product(2).await.unwrap().quantity, 0);

        store.delete_product(1).await.unwrap();
        assert!(store.get_product(1).await.unwrap_err().is_not_found());

        let err = store
            .batch_update_inventory(&InventoryUpdates::from([(1, 99)]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_product(2).await.unwrap().quantity, 0);
    }
}

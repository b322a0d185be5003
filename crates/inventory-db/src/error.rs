//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Names the failing stage and product id        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller walks `source()` for the full chain                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Batch Errors
//! ```text
//! batch_update_inventory
//!   ├── Begin          cannot start transaction
//!   ├── BatchGet       existence check failed (wraps NotFound / Query)
//!   ├── BatchUpdate    quantity write failed
//!   ├── Rollback       rollback failed: state UNKNOWN
//!   └── Commit         commit failed: outcome UNKNOWN
//! ```

use thiserror::Error;

use inventory_core::ProductId;

/// Database operation errors.
///
/// Every storage fault is kept as the `source` of the variant naming the
/// stage it happened in.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `get_product` with an unknown id
    /// - Existence guard of update/delete/batch
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A read failed for a reason other than a missing row.
    #[error("Query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// The INSERT statement failed.
    #[error("Failed to insert product")]
    Insert(#[source] sqlx::Error),

    /// The row was inserted but its assigned id could not be read back.
    #[error("Product inserted but its id could not be retrieved")]
    IdentityRetrieval(#[source] sqlx::Error),

    /// The UPDATE statement failed after the existence guard passed.
    #[error("Failed to update product {id}")]
    Update {
        id: ProductId,
        #[source]
        source: sqlx::Error,
    },

    /// The DELETE statement failed after the existence guard passed.
    #[error("Failed to delete product {id}")]
    Delete {
        id: ProductId,
        #[source]
        source: sqlx::Error,
    },

    /// A batch transaction could not be started.
    #[error("Failed to begin transaction")]
    Begin(#[source] sqlx::Error),

    /// Existence check failed mid-batch. The transaction was rolled back.
    #[error("Get failed mid-batch for product {id}")]
    BatchGet {
        id: ProductId,
        #[source]
        source: Box<DbError>,
    },

    /// Quantity write failed mid-batch. The transaction was rolled back.
    #[error("Update failed mid-batch for product {id}")]
    BatchUpdate {
        id: ProductId,
        #[source]
        source: sqlx::Error,
    },

    /// Rolling back after `cause` failed too.
    ///
    /// The final state of that transaction is unknown. The store itself
    /// remains usable for later calls.
    #[error("Rollback failed after: {cause}")]
    Rollback {
        cause: Box<DbError>,
        #[source]
        source: sqlx::Error,
    },

    /// All batch work succeeded but COMMIT failed. Treat the outcome as unknown.
    #[error("Failed to commit transaction")]
    Commit(#[source] sqlx::Error),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// An environment variable held a value that could not be parsed.
    #[error("Invalid configuration value for {0}")]
    InvalidConfig(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Query error with a short description of the read.
    pub fn query(context: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Query {
            context: context.into(),
            source,
        }
    }

    /// Returns true when the root problem is a missing row.
    ///
    /// Sees through the batch and rollback wrappers so callers can branch
    /// on "does not exist" regardless of which operation reported it.
    pub fn is_not_found(&self) -> bool {
        match self {
            DbError::NotFound { .. } => true,
            DbError::BatchGet { source, .. } => source.is_not_found(),
            DbError::Rollback { cause, .. } => cause.is_not_found(),
            _ => false,
        }
    }

    /// Returns true when a transaction ended without a known outcome.
    pub fn is_state_unknown(&self) -> bool {
        matches!(self, DbError::Rollback { .. } | DbError::Commit(_))
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! Domain-specific error types for drugtable
//!
//! - **StoreError**: failures raised by a [`crate::store::DrugStore`] backend
//! - **DrugError**: query resolution, validation and lookup failures
//!
//! HTTP mapping lives in [`crate::server::error`]; nothing here knows about status codes
//! beyond the client/server classification helpers.

use thiserror::Error;

/// Errors raised by a record store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint on the drug code was violated
    #[error("Drug code '{0}' already exists")]
    DuplicateCode(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Backing file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file contents could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while resolving drug queries and writes
#[derive(Error, Debug)]
pub enum DrugError {
    /// Drug not found by ID
    #[error("Drug {0} not found")]
    NotFound(i32),

    /// Drug code already exists
    #[error("Drug code already exists")]
    DuplicateCode(String),

    /// Query string parameters could not be resolved
    #[error("{0}")]
    InvalidQuery(String),

    /// Payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Store operation failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DrugError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode(code) => DrugError::DuplicateCode(code),
            other => DrugError::Store(other),
        }
    }
}

impl DrugError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DrugError::NotFound(_)
                | DrugError::DuplicateCode(_)
                | DrugError::InvalidQuery(_)
                | DrugError::Validation(_)
        )
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for drug operations
pub type DrugResult<T> = Result<T, DrugError>;

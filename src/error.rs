use std::path::Path;

use rust_decimal::Decimal;

use crate::records::ProductId;

/// Everything that can go wrong while reading or changing the records.
/// None of these are fatal, the operation that raised it is aborted (or the
/// offending item skipped) and the menu keeps going
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// Malformed or out of range input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A referenced id has no matching record
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Requested more units than there are in stock
    #[error("Insufficient stock for product {product_id}. Available: {available}, requested: {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The data files could not be read or written
    #[error("Storage failure on {path}: {reason}")]
    Persistence { path: String, reason: String },
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn persistence(path: &Path, reason: impl ToString) -> Self {
        StoreError::Persistence {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Rejects negative money or scores
pub fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), StoreError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(StoreError::validation(format!(
            "{} cannot be negative, got {}",
            field, value
        )));
    }
    Ok(())
}

//! Repositories over the hosted backend.
//!
//! Each repository is scoped to one signed-in user: it carries their access
//! token and id, filters every listing by owner and stamps `user_id` on new
//! rows. Raw rows are decoded into `tindahan_core` records here.

pub mod liabilities;
pub mod products;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use tindahan_core::UserId;

use crate::backend::{BackendError, Row, Table};

pub use liabilities::LiabilityRepository;
pub use products::ProductRepository;

/// Fallback extension for uploads without a usable one.
const DEFAULT_IMAGE_EXTENSION: &str = "bin";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stored row could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A record could not be encoded for the backend.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Decode one row, naming the table on failure.
fn decode<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, RepositoryError> {
    serde_json::from_value(row)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {table} row: {e}")))
}

/// Decode a listing, skipping rows that do not decode.
fn decode_all<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match decode(table, row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable row");
                None
            }
        })
        .collect()
}

/// Object name for an uploaded product image: `{owner}-{unix_millis}.{ext}`.
///
/// The extension comes from the uploaded file name, lowercased; anything
/// missing or non-alphanumeric becomes `bin`.
#[must_use]
pub fn image_file_name(owner: UserId, original_name: &str, now: DateTime<Utc>) -> String {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());
    format!("{owner}-{}.{extension}", now.timestamp_millis())
}

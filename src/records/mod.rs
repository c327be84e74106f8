//! Formula records and the document collaborator that serves them.
//!
//! - [`FormulaRecord`] is the read-only record shape
//! - [`FieldFilter`] is the single equality predicate a query carries
//! - [`DocumentStore`] is the seam the feed loader reads through
//! - [`FirestoreClient`] implements it over the Firestore REST API

mod firestore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

use crate::util::http::{BaseUrlError, BodyError};

pub use firestore::FirestoreClient;

/// Shown when a record has no usable name.
pub const DEFAULT_NAME: &str = "Untitled";
/// Shown when a record has no usable concentration.
pub const DEFAULT_CONCENTRATION: &str = "EDP";

// ============================================================================
// Records
// ============================================================================

/// A formula document as stored remotely. Never written by this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRecord {
    /// Document id, owned by the store.
    pub id: String,
    pub name: Option<String>,
    pub concentration: Option<String>,
    pub public: bool,
    /// Owner's user id.
    pub uid: String,
    pub updated: Option<DateTime<Utc>>,
}

// ============================================================================
// Filters
// ============================================================================

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    String(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// `field == value`, the only predicate shape the store is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: FilterValue,
}

impl FieldFilter {
    pub fn equals(field: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// `public == true`
    pub fn public_only() -> Self {
        Self::equals("public", FilterValue::Bool(true))
    }

    /// `uid == user_id`
    pub fn owned_by(user_id: &str) -> Self {
        Self::equals("uid", FilterValue::String(user_id.to_string()))
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.field, self.value)
    }
}

// ============================================================================
// Document Store
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error(transparent)]
    BaseUrl(#[from] BaseUrlError),
}

impl From<BodyError> for StoreError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::Network(e) => Self::Network(e),
            BodyError::TooLarge(limit) => Self::ResponseTooLarge(limit),
        }
    }
}

/// Remote collection reader.
///
/// One call is one read: no retries, no caching. The returned order is
/// whatever the store produced.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        filter: &FieldFilter,
        auth: Option<&SecretString>,
    ) -> Result<Vec<FormulaRecord>, StoreError>;
}

//! Error types for inventory collection and export

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while collecting or exporting the inventory
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Listing or reading compartments failed
    #[error("Compartment lookup failed for {compartment_id}: {message}")]
    DirectoryLookup {
        compartment_id: String,
        message: String,
        /// HTTP status of the failed call, when there was one
        status: Option<u16>,
    },

    /// Listing instances, volumes or availability domains failed
    #[error("Listing {resource} in {region} failed: {message}")]
    InventoryList {
        region: String,
        resource: String,
        message: String,
        status: Option<u16>,
    },

    /// Writing the report failed
    #[error("Export to {path:?} failed: {message}")]
    Export { path: PathBuf, message: String },

    /// The property schema could not be loaded
    #[error("Property schema error: {0}")]
    Schema(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

impl InventoryError {
    pub fn directory(compartment_id: &str, err: impl std::fmt::Display) -> Self {
        InventoryError::DirectoryLookup {
            compartment_id: compartment_id.to_string(),
            message: err.to_string(),
            status: None,
        }
    }

    pub fn listing(region: &str, resource: &str, err: impl std::fmt::Display) -> Self {
        InventoryError::InventoryList {
            region: region.to_string(),
            resource: resource.to_string(),
            message: err.to_string(),
            status: None,
        }
    }

    /// Attach the HTTP status of the failed call
    pub fn with_status(mut self, code: Option<u16>) -> Self {
        match &mut self {
            InventoryError::DirectoryLookup { status, .. }
            | InventoryError::InventoryList { status, .. } => *status = code,
            _ => {}
        }
        self
    }

    /// HTTP status behind a lookup or listing failure
    pub fn status(&self) -> Option<u16> {
        match self {
            InventoryError::DirectoryLookup { status, .. }
            | InventoryError::InventoryList { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<csv::Error> for InventoryError {
    fn from(err: csv::Error) -> Self {
        InventoryError::Export {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

/// How a class of remote failures is handled during collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and continue as if the call returned nothing
    BestEffort,
    /// Propagate the failure to the caller
    #[default]
    Abort,
}

impl FailurePolicy {
    /// Apply the policy to a single result. Swallowed failures are logged
    /// and come back as `Ok(None)`.
    pub fn tolerate<T>(self, result: InventoryResult<T>) -> InventoryResult<Option<T>> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (FailurePolicy::BestEffort, Err(e)) => {
                tracing::error!("{}, continuing with empty result", e);
                Ok(None)
            }
            (FailurePolicy::Abort, Err(e)) => Err(e),
        }
    }

    /// Apply the policy to a listing, turning swallowed failures into an
    /// empty collection
    pub fn recover<T>(self, result: InventoryResult<Vec<T>>) -> InventoryResult<Vec<T>> {
        Ok(self.tolerate(result)?.unwrap_or_default())
    }
}

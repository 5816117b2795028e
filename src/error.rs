//! # Error Types
//!
//! Two layers of errors exist in the batch:
//!
//! - [`BatchError`] covers round-level and batch-level failures (dataset access,
//!   pool provisioning, configuration). These abort a single round at most.
//! - [`WorkerFault`] covers everything that can go wrong inside one clip job.
//!   It never crosses the worker boundary; see [`crate::worker::execute_job`].
//!
//! A job that fails is not an error at all: it is a [`crate::dispatcher::JobOutcome`]
//! whose `success` flag is `false`.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum BatchError {
    /// Boundary or target dataset unreadable, or identity field missing
    #[error("Data access error on dataset '{dataset}': {reason}")]
    DataAccess { dataset: String, reason: String },

    /// The worker pool for a round could not be created
    #[error("Pool provisioning error: {reason}")]
    PoolProvisioning { reason: String },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error in {source_name}: {reason}")]
    Configuration { source_name: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl BatchError {
    pub fn data_access(dataset: impl Into<String>, reason: impl ToString) -> Self {
        BatchError::DataAccess {
            dataset: dataset.into(),
            reason: reason.to_string(),
        }
    }

    pub fn pool_provisioning(reason: impl Into<String>) -> Self {
        BatchError::PoolProvisioning {
            reason: reason.into(),
        }
    }

    pub fn configuration(source_name: impl Into<String>, reason: impl ToString) -> Self {
        BatchError::Configuration {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable category used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            BatchError::DataAccess { .. } => "data_access",
            BatchError::PoolProvisioning { .. } => "pool_provisioning",
            BatchError::Configuration { .. } => "configuration",
            BatchError::Validation(_) => "validation",
        }
    }
}

impl From<::config::ConfigError> for BatchError {
    fn from(err: ::config::ConfigError) -> Self {
        BatchError::configuration("config", err)
    }
}

pub type BatchResult<T> = Result<T, BatchError>;

/// Faults raised inside a single clip job
#[derive(Debug, Error)]
pub enum WorkerFault {
    /// The clip backend reported a failure
    #[error("Clip backend failed: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend panicked while running the job
    #[error("Worker panicked: {0}")]
    Panicked(String),

    /// The blocking execution slot could not be joined
    #[error("Worker slot failed to join: {0}")]
    Join(String),
}

impl WorkerFault {
    /// Build a fault from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        WorkerFault::Panicked(message)
    }
}

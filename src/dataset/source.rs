//! Identifier enumeration seam

use async_trait::async_trait;

use super::{DatasetRef, Identifier};
use crate::error::BatchResult;

/// Read-only access to the datasets of a workspace
///
/// Implementations must release any handle they open before returning,
/// on both the success and the error path.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// Source name for logging
    fn source_name(&self) -> &'static str;

    /// The dataset's native identity field, used when none is configured
    async fn identity_field(&self, dataset: &DatasetRef) -> BatchResult<String>;

    /// Identifiers of every feature in `dataset`, in the dataset's own order
    ///
    /// Fails with [`crate::error::BatchError::DataAccess`] when the dataset
    /// cannot be opened or a feature lacks `field`.
    async fn enumerate(&self, dataset: &DatasetRef, field: &str) -> BatchResult<Vec<Identifier>>;

    /// Confirm that `dataset` exists and is readable
    async fn check_dataset(&self, dataset: &DatasetRef) -> BatchResult<()>;
}

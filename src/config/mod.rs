//! # Batch Configuration
//!
//! Everything a batch needs from outside the core: where the datasets live,
//! which dataset is the boundary, the ordered target list, where outputs go,
//! and how many worker slots to use.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clip_batch::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // File settings, overridden by CLIP_BATCH__* environment variables
//! let config = ConfigLoader::new()
//!     .with_file("config/clip-batch.yaml")
//!     .load()?;
//!
//! println!("{} targets", config.targets.len());
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::dataset::{is_path_safe_name, DatasetRef};
use crate::error::{BatchError, BatchResult};

pub use loader::{ConfigLoader, ENV_PREFIX};

/// Root configuration for one batch run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Directory holding the boundary and target datasets
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Boundary ("clipper") dataset name
    pub boundary: String,

    /// Identity field of the boundary; the dataset's native id field if unset
    #[serde(default)]
    pub id_field: Option<String>,

    /// Target datasets, clipped in this order
    pub targets: Vec<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output file extension, without the leading dot
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Worker slots per round; the host's logical core count if unset
    #[serde(default)]
    pub parallelism: Option<usize>,

    #[serde(default)]
    pub worker: WorkerConfig,
}

/// External clip worker settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Worker executable; looked up on PATH when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Arguments placed before the per-job arguments
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_output_extension() -> String {
    "shp".to_string()
}

impl BatchConfig {
    /// Minimal configuration with defaults for everything optional
    pub fn new(boundary: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            workspace: default_workspace(),
            boundary: boundary.into(),
            id_field: None,
            targets,
            output_dir: default_output_dir(),
            output_extension: default_output_extension(),
            parallelism: None,
            worker: WorkerConfig::default(),
        }
    }

    pub fn boundary_ref(&self) -> DatasetRef {
        DatasetRef::new(self.boundary.clone())
    }

    pub fn target_refs(&self) -> Vec<DatasetRef> {
        self.targets.iter().cloned().map(DatasetRef::from).collect()
    }

    /// Check the configuration before any dataset is touched
    pub fn validate(&self) -> BatchResult<()> {
        if self.boundary.trim().is_empty() {
            return Err(invalid("boundary", "boundary dataset name cannot be empty"));
        }

        if self.targets.is_empty() {
            return Err(invalid("targets", "at least one target dataset is required"));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !is_path_safe_name(target) {
                return Err(invalid(
                    "targets",
                    format!("'{target}' is not a usable dataset name"),
                ));
            }
            if !seen.insert(target.as_str()) {
                return Err(invalid(
                    "targets",
                    format!("target dataset '{target}' is listed more than once"),
                ));
            }
        }

        if let Some(field) = &self.id_field {
            if field.trim().is_empty() {
                return Err(invalid("id_field", "identity field cannot be blank"));
            }
        }

        if self.output_extension.is_empty() || self.output_extension.starts_with('.') {
            return Err(invalid(
                "output_extension",
                "extension must be non-empty and given without a leading dot",
            ));
        }

        if self.parallelism == Some(0) {
            return Err(invalid("parallelism", "parallelism must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: impl ToString) -> BatchError {
    BatchError::configuration(format!("batch config ({key})"), reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BatchConfig {
        BatchConfig::new("States", vec!["Roads".to_string(), "Hydro".to_string()])
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.output_extension, "shp");
        assert_eq!(config.workspace, PathBuf::from("."));
        assert!(config.parallelism.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(
            config.target_refs(),
            vec![DatasetRef::from("Roads"), DatasetRef::from("Hydro")]
        );
    }

    #[test]
    fn test_validation_failures() {
        let mut c = config();
        c.targets.clear();
        assert!(c.validate().is_err());

        let mut c = config();
        c.targets.push("Roads".to_string());
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let mut c = config();
        c.boundary = "  ".to_string();
        assert!(c.validate().is_err());

        let mut c = config();
        c.output_extension = ".shp".to_string();
        assert!(c.validate().is_err());

        let mut c = config();
        c.parallelism = Some(0);
        assert!(matches!(
            c.validate().unwrap_err(),
            BatchError::Configuration { .. }
        ));
    }
}

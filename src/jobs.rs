//! # Job Builder
//!
//! Expands the boundary identifiers into one [`JobDescriptor`] per identifier
//! for a single target dataset. Output paths are a pure function of
//! (output directory, identifier, target, extension), so re-running a batch
//! overwrites the artifacts of the previous run instead of adding new ones.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dataset::{is_path_safe_name, DatasetRef, Identifier};
use crate::error::{BatchError, BatchResult};

/// One clip operation: clip `target` by the boundary feature `identifier`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub boundary: DatasetRef,
    pub target: DatasetRef,
    pub id_field: String,
    pub identifier: Identifier,
    pub output_path: PathBuf,
}

/// Builds job lists for the rounds of a batch
#[derive(Debug, Clone)]
pub struct JobBuilder {
    boundary: DatasetRef,
    id_field: String,
    output_dir: PathBuf,
    extension: String,
}

impl JobBuilder {
    pub fn new(
        boundary: DatasetRef,
        id_field: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            boundary,
            id_field: id_field.into(),
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn boundary(&self) -> &DatasetRef {
        &self.boundary
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// `<output_dir>/clip_<identifier>_<target>.<ext>`
    pub fn output_path(&self, identifier: &Identifier, target: &DatasetRef) -> PathBuf {
        output_path(&self.output_dir, identifier, target, &self.extension)
    }

    /// One descriptor per identifier, in identifier order
    ///
    /// An empty identifier list yields an empty job list. Identifiers or
    /// target names that cannot be embedded in a file name are rejected, and
    /// so are identifiers that render to the same text (`1` and `"1"`), since
    /// their jobs would write the same artifact.
    pub fn build(
        &self,
        identifiers: &[Identifier],
        target: &DatasetRef,
    ) -> BatchResult<Vec<JobDescriptor>> {
        if !is_path_safe_name(target.name()) {
            return Err(BatchError::Validation(format!(
                "target dataset name '{target}' cannot be used in an output file name"
            )));
        }

        if let Some(bad) = identifiers.iter().find(|id| !id.is_path_safe()) {
            return Err(BatchError::Validation(format!(
                "identifier '{bad}' cannot be used in an output file name"
            )));
        }

        let mut rendered = HashSet::with_capacity(identifiers.len());
        if let Some(dup) = identifiers.iter().find(|id| !rendered.insert(id.to_string())) {
            return Err(BatchError::Validation(format!(
                "identifier '{dup}' occurs more than once in '{}'; output paths would collide",
                self.id_field
            )));
        }

        Ok(identifiers
            .iter()
            .map(|identifier| JobDescriptor {
                boundary: self.boundary.clone(),
                target: target.clone(),
                id_field: self.id_field.clone(),
                identifier: identifier.clone(),
                output_path: self.output_path(identifier, target),
            })
            .collect())
    }
}

pub fn output_path(
    output_dir: &Path,
    identifier: &Identifier,
    target: &DatasetRef,
    extension: &str,
) -> PathBuf {
    output_dir.join(format!("clip_{identifier}_{target}.{extension}"))
}

//! # Datasets and Identifiers
//!
//! A batch clips a set of *target* datasets against one *boundary* dataset.
//! Every boundary feature contributes one [`Identifier`]; the pair
//! (identifier, target) names exactly one clip job.
//!
//! Datasets are read through the [`IdentifierSource`] seam. The crate ships a
//! [`GeoJsonWorkspace`] implementation that treats a directory of GeoJSON
//! FeatureCollections as the workspace.

pub mod geojson;
pub mod source;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use geojson::GeoJsonWorkspace;
pub use source::IdentifierSource;

/// Identity value read from a boundary feature
///
/// Identifiers are opaque to the orchestrator: they are only compared, hashed,
/// ordered and rendered into output file names. Integer object ids are the
/// common case; string ids are accepted for sources that key features by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Integer(i64),
    Text(String),
}

impl Identifier {
    /// True when the rendered identifier can be embedded in a file name
    pub fn is_path_safe(&self) -> bool {
        match self {
            Identifier::Integer(_) => true,
            Identifier::Text(text) => is_path_safe_name(text),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Integer(value) => write!(f, "{value}"),
            Identifier::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Integer(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Text(value)
    }
}

/// Name of a dataset inside the configured workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetRef(String);

impl DatasetRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DatasetRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Non-empty and free of path separators and parent references
pub(crate) fn is_path_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\', '\0'][..])
}

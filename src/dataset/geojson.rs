//! # GeoJSON Workspace
//!
//! Treats a directory as a workspace of datasets, one GeoJSON
//! `FeatureCollection` per file. Dataset `States` resolves to
//! `<workspace>/States.geojson`, falling back to `<workspace>/States.json`.
//!
//! The native identity field is the GeoJSON feature `id` member. Any other
//! field name is looked up in the feature's `properties`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{is_path_safe_name, DatasetRef, Identifier, IdentifierSource};
use crate::error::{BatchError, BatchResult};

/// Identity field name that maps to the GeoJSON feature `id` member
pub const FEATURE_ID_FIELD: &str = "id";

const EXTENSIONS: [&str; 2] = ["geojson", "json"];

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Directory of GeoJSON datasets
#[derive(Debug, Clone)]
pub struct GeoJsonWorkspace {
    root: PathBuf,
}

impl GeoJsonWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locate the file backing `dataset`
    pub async fn dataset_path(&self, dataset: &DatasetRef) -> BatchResult<PathBuf> {
        if !is_path_safe_name(dataset.name()) {
            return Err(BatchError::data_access(
                dataset.name(),
                "dataset name is not a plain file name",
            ));
        }

        for ext in EXTENSIONS {
            let candidate = self.root.join(format!("{}.{ext}", dataset.name()));
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => return Ok(candidate),
                _ => continue,
            }
        }

        Err(BatchError::data_access(
            dataset.name(),
            format!("no .geojson or .json file in {}", self.root.display()),
        ))
    }

    async fn load(&self, dataset: &DatasetRef) -> BatchResult<FeatureCollection> {
        let path = self.dataset_path(dataset).await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| BatchError::data_access(dataset.name(), e))?;

        let collection: FeatureCollection = serde_json::from_slice(&bytes)
            .map_err(|e| BatchError::data_access(dataset.name(), format!("invalid GeoJSON: {e}")))?;

        if collection.kind != "FeatureCollection" {
            return Err(BatchError::data_access(
                dataset.name(),
                format!("expected a FeatureCollection, found '{}'", collection.kind),
            ));
        }

        debug!(
            dataset = %dataset,
            path = %path.display(),
            features = collection.features.len(),
            "Loaded GeoJSON dataset"
        );

        Ok(collection)
    }
}

#[async_trait]
impl IdentifierSource for GeoJsonWorkspace {
    fn source_name(&self) -> &'static str {
        "geojson"
    }

    async fn identity_field(&self, dataset: &DatasetRef) -> BatchResult<String> {
        self.dataset_path(dataset).await?;
        Ok(FEATURE_ID_FIELD.to_string())
    }

    async fn enumerate(&self, dataset: &DatasetRef, field: &str) -> BatchResult<Vec<Identifier>> {
        let collection = self.load(dataset).await?;

        collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let value = if field == FEATURE_ID_FIELD {
                    feature.id.as_ref()
                } else {
                    feature.properties.as_ref().and_then(|props| props.get(field))
                };

                let value = value.ok_or_else(|| {
                    BatchError::data_access(
                        dataset.name(),
                        format!("feature {index} has no '{field}' field"),
                    )
                })?;

                identifier_from_value(value).ok_or_else(|| {
                    BatchError::data_access(
                        dataset.name(),
                        format!(
                            "feature {index} '{field}' value {value} is not an integer or string identifier"
                        ),
                    )
                })
            })
            .collect()
    }

    async fn check_dataset(&self, dataset: &DatasetRef) -> BatchResult<()> {
        self.dataset_path(dataset).await.map(|_| ())
    }
}

fn identifier_from_value(value: &Value) -> Option<Identifier> {
    match value {
        Value::Number(n) => n.as_i64().map(Identifier::Integer),
        Value::String(s) => Some(Identifier::Text(s.clone())),
        _ => None,
    }
}

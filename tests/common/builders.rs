//! Fixture builders for GeoJSON workspaces

#![allow(dead_code)]

use clip_batch::{BatchConfig, Identifier};
use serde_json::{json, Map, Value};
use std::path::Path;
use tempfile::TempDir;

/// Temporary workspace with `workspace/` for datasets and `output/` for artifacts
pub struct WorkspaceFixture {
    pub dir: TempDir,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("workspace")).expect("workspace dir");
        Self { dir }
    }

    pub fn workspace(&self) -> std::path::PathBuf {
        self.dir.path().join("workspace")
    }

    pub fn output(&self) -> std::path::PathBuf {
        self.dir.path().join("output")
    }

    /// Write a polygon FeatureCollection whose feature ids are `ids`
    pub fn with_boundary(self, name: &str, ids: &[i64]) -> Self {
        let features: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "type": "Feature",
                    "id": id,
                    "properties": {"NAME": format!("polygon-{id}")},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                    }
                })
            })
            .collect();
        write_collection(&self.workspace(), name, features);
        self
    }

    /// Write a polygon FeatureCollection keyed by property `field`
    pub fn with_boundary_property(self, name: &str, field: &str, values: &[Value]) -> Self {
        let features: Vec<Value> = values
            .iter()
            .map(|value| {
                let mut properties = Map::new();
                properties.insert(field.to_string(), value.clone());
                json!({
                    "type": "Feature",
                    "properties": properties,
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                    }
                })
            })
            .collect();
        write_collection(&self.workspace(), name, features);
        self
    }

    /// Write an empty line-feature dataset to be clipped
    pub fn with_target(self, name: &str) -> Self {
        write_collection(&self.workspace(), name, Vec::new());
        self
    }

    pub fn config(&self, boundary: &str, targets: &[&str]) -> BatchConfig {
        let mut config = BatchConfig::new(boundary, targets.iter().map(|t| t.to_string()).collect());
        config.workspace = self.workspace();
        config.output_dir = self.output();
        config
    }
}

fn write_collection(dir: &Path, name: &str, features: Vec<Value>) {
    let body = json!({"type": "FeatureCollection", "features": features});
    std::fs::write(dir.join(format!("{name}.geojson")), body.to_string()).expect("write dataset");
}

pub fn ids(values: &[i64]) -> Vec<Identifier> {
    values.iter().map(|v| Identifier::from(*v)).collect()
}

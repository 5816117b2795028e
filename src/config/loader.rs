//! Configuration Loader
//!
//! Environment-aware loading: a base file, an optional per-environment
//! override file next to it, then `CLIP_BATCH__*` environment variables.
//! Later sources win.
//!
//! For a base file `config/clip-batch.yaml` in environment `production`, the
//! override file is `config/clip-batch.production.yaml`.

use ::config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::BatchConfig;
use crate::error::{BatchError, BatchResult};

/// Prefix of environment variable overrides (`CLIP_BATCH__OUTPUT_DIR=...`)
pub const ENV_PREFIX: &str = "CLIP_BATCH";

/// Variable naming the deployment environment
pub const ENVIRONMENT_VAR: &str = "CLIP_BATCH_ENV";

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    environment: String,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            environment: detect_environment(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into().to_lowercase();
        self
    }

    /// Override the environment variable prefix; mainly for tests
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Load, merge and validate
    pub fn load(&self) -> BatchResult<BatchConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            check_config_file(path)?;
            builder = builder.add_source(File::from(path.as_path()).required(true));

            if let Some(override_path) = environment_override_path(path, &self.environment) {
                debug!(
                    environment = %self.environment,
                    path = %override_path.display(),
                    "Checking for environment override file"
                );
                builder = builder.add_source(File::from(override_path.as_path()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("targets")
                .with_list_parse_key("worker.args"),
        );

        let config: BatchConfig = builder
            .build()?
            .try_deserialize()
            .map_err(|e| BatchError::configuration(self.source_name(), e))?;

        config.validate()?;

        debug!(
            environment = %self.environment,
            boundary = %config.boundary,
            targets = ?config.targets,
            output_dir = %config.output_dir.display(),
            parallelism = ?config.parallelism,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn source_name(&self) -> String {
        match &self.file {
            Some(path) => path.display().to_string(),
            None => format!("{}__* environment", self.env_prefix),
        }
    }
}

/// Detect the deployment environment, defaulting to `development`
pub fn detect_environment() -> String {
    env::var(ENVIRONMENT_VAR)
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}

fn check_config_file(path: &Path) -> BatchResult<()> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BatchError::configuration(path.display().to_string(), e))?;

    if !metadata.is_file() {
        return Err(BatchError::configuration(
            path.display().to_string(),
            "configuration path must point to a regular file",
        ));
    }

    Ok(())
}

fn environment_override_path(base: &Path, environment: &str) -> Option<PathBuf> {
    let stem = base.file_stem()?.to_str()?;
    let ext = base.extension()?.to_str()?;
    Some(base.with_file_name(format!("{stem}.{environment}.{ext}")))
}

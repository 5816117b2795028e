//! # Batch Orchestrator
//!
//! Runs one round per target dataset, strictly in configuration order, each
//! round fully drained before the next begins:
//!
//! ```text
//! enumerate boundary ids ──► for each target:
//!                               check target ─► build jobs ─► dispatch ─► report
//! ```
//!
//! Failures are contained at the narrowest level that can absorb them:
//!
//! - a failed job is an outcome inside its round's [`RoundReport`];
//! - a round-level error (target unreadable, pool cannot be provisioned) is
//!   recorded as [`RoundSummary::Failed`] and the next target still runs;
//! - a boundary enumeration error fails every round, since none can build jobs.
//!
//! Whatever happens, the batch runtime is measured from the start of
//! [`BatchOrchestrator::run`] and always reported.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::dataset::{DatasetRef, Identifier, IdentifierSource};
use crate::dispatcher::{Dispatcher, RoundReport};
use crate::error::{BatchError, BatchResult};
use crate::jobs::JobBuilder;
use crate::logging::{log_batch_error, log_batch_runtime, log_round_operation};

/// Outcome of one target dataset's round
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundSummary {
    /// All jobs ran; some may have failed
    Completed(RoundReport),
    /// The round could not run
    Failed { target: DatasetRef, error: BatchError },
}

impl RoundSummary {
    pub fn target(&self) -> &DatasetRef {
        match self {
            RoundSummary::Completed(report) => &report.target,
            RoundSummary::Failed { target, .. } => target,
        }
    }

    /// Failed job count, or `None` when the round itself failed
    pub fn failed_count(&self) -> Option<usize> {
        match self {
            RoundSummary::Completed(report) => Some(report.failed_count()),
            RoundSummary::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&BatchError> {
        match self {
            RoundSummary::Completed(_) => None,
            RoundSummary::Failed { error, .. } => Some(error),
        }
    }
}

/// Statistics of a whole batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub rounds: Vec<RoundSummary>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total_failed_jobs(&self) -> usize {
        self.rounds.iter().filter_map(RoundSummary::failed_count).sum()
    }

    pub fn failed_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.error().is_some()).count()
    }

    /// True when every round ran and every job succeeded
    pub fn is_clean(&self) -> bool {
        self.failed_rounds() == 0 && self.total_failed_jobs() == 0
    }
}

/// Sequences rounds across the configured target datasets
pub struct BatchOrchestrator {
    config: BatchConfig,
    source: Arc<dyn IdentifierSource>,
    dispatcher: Dispatcher,
}

impl BatchOrchestrator {
    pub fn new(config: BatchConfig, source: Arc<dyn IdentifierSource>, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            source,
            dispatcher,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run every round and report the batch
    ///
    /// Never fails: errors are recorded per round, and the runtime report is
    /// emitted on every path.
    #[instrument(skip(self), fields(boundary = %self.config.boundary, targets = self.config.targets.len()))]
    pub async fn run(&self) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();
        let targets = self.config.target_refs();

        info!(
            batch_id = %batch_id,
            source = self.source.source_name(),
            backend = self.dispatcher.backend_name(),
            slots = self.dispatcher.parallelism(),
            "Starting clip batch"
        );

        let rounds = match self.prepare().await {
            Ok((builder, identifiers)) => {
                let mut rounds = Vec::with_capacity(targets.len());
                for target in &targets {
                    rounds.push(self.run_round(&builder, &identifiers, target).await);
                }
                rounds
            }
            Err(error) => {
                log_batch_error(
                    "orchestrator",
                    "enumerate_identifiers",
                    &error.to_string(),
                    Some(&self.config.boundary),
                );
                targets
                    .into_iter()
                    .map(|target| RoundSummary::Failed {
                        target,
                        error: error.clone(),
                    })
                    .collect()
            }
        };

        let report = BatchReport {
            batch_id,
            rounds,
            elapsed: started.elapsed(),
        };
        log_batch_runtime(
            &batch_id.to_string(),
            report.elapsed,
            report.rounds.len(),
            report.failed_rounds(),
        );
        report
    }

    /// Resolve the identity field and read the boundary identifiers
    async fn prepare(&self) -> BatchResult<(JobBuilder, Vec<Identifier>)> {
        let boundary = self.config.boundary_ref();

        let id_field = match &self.config.id_field {
            Some(field) => field.clone(),
            None => self.source.identity_field(&boundary).await?,
        };

        info!(boundary = %boundary, id_field = %id_field, "Creating polygon identifier list");
        let identifiers = self.source.enumerate(&boundary, &id_field).await?;
        info!(
            boundary = %boundary,
            identifiers = identifiers.len(),
            "There are {} identifiers (polygons) to process",
            identifiers.len()
        );

        let builder = JobBuilder::new(
            boundary,
            id_field,
            self.config.output_dir.clone(),
            self.config.output_extension.clone(),
        );
        Ok((builder, identifiers))
    }

    async fn run_round(
        &self,
        builder: &JobBuilder,
        identifiers: &[Identifier],
        target: &DatasetRef,
    ) -> RoundSummary {
        match self.try_round(builder, identifiers, target).await {
            Ok(report) => {
                log_round_operation(
                    "round_completed",
                    target.name(),
                    report.submitted,
                    Some(report.failed_count()),
                    None,
                );
                RoundSummary::Completed(report)
            }
            Err(error) => {
                warn!(
                    target_dataset = %target,
                    error_kind = error.kind(),
                    error = %error,
                    "Round aborted"
                );
                log_round_operation(
                    "round_failed",
                    target.name(),
                    0,
                    None,
                    Some(&error.to_string()),
                );
                RoundSummary::Failed {
                    target: target.clone(),
                    error,
                }
            }
        }
    }

    async fn try_round(
        &self,
        builder: &JobBuilder,
        identifiers: &[Identifier],
        target: &DatasetRef,
    ) -> BatchResult<RoundReport> {
        self.source.check_dataset(target).await?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| {
                BatchError::data_access(self.config.output_dir.display().to_string(), e)
            })?;

        let jobs = builder.build(identifiers, target)?;
        info!(target_dataset = %target, jobs = jobs.len(), "{target} job list has {} elements", jobs.len());

        self.dispatcher.dispatch_round(target, jobs).await
    }
}

#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Clip Batch
//!
//! Parallel orchestration of per-polygon clip jobs.
//!
//! ## Overview
//!
//! A batch clips a list of *target* datasets against every polygon of a
//! *boundary* dataset, writing one artifact per (polygon, target) pair. The
//! clip itself is an opaque, possibly failing call into a geospatial backend;
//! this crate owns everything around it:
//!
//! - enumerating the boundary's polygon identifiers,
//! - building one job per identifier for each target,
//! - running each target's jobs on a bounded pool sized to the host,
//! - collecting exactly one success flag per job,
//! - reporting failure counts and the total runtime without ever letting one
//!   failed job, or one failed target, stop the batch.
//!
//! ## Module Organization
//!
//! - [`dataset`] - Identifiers, dataset references and the enumeration seam
//! - [`jobs`] - Job descriptors and deterministic output naming
//! - [`worker`] - Clip backend seam and the fault-absorbing worker boundary
//! - [`dispatcher`] - Bounded worker pool and per-round outcome collection
//! - [`orchestrator`] - Round sequencing and batch statistics
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`logging`] - Structured logging and reporting helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clip_batch::{BatchConfig, BatchOrchestrator, Dispatcher, GeoJsonWorkspace, ProcessClipBackend};
//!
//! # async fn example() {
//! let mut config = BatchConfig::new("States", vec!["Roads".into(), "Hydro".into()]);
//! config.workspace = "/data/usa".into();
//! config.output_dir = "/data/output".into();
//!
//! let source = Arc::new(GeoJsonWorkspace::new(&config.workspace));
//! let backend = Arc::new(ProcessClipBackend::new(None, vec![], &config.workspace));
//! let orchestrator = BatchOrchestrator::new(config, source, Dispatcher::new(backend));
//!
//! let report = orchestrator.run().await;
//! println!("{} failed jobs in {:?}", report.total_failed_jobs(), report.elapsed);
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod dispatcher;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod orchestrator;
pub mod worker;

pub use config::{BatchConfig, ConfigLoader, WorkerConfig};
pub use dataset::{DatasetRef, GeoJsonWorkspace, Identifier, IdentifierSource};
pub use dispatcher::{Dispatcher, JobOutcome, RoundReport, RoundState};
pub use error::{BatchError, BatchResult, WorkerFault};
pub use jobs::{JobBuilder, JobDescriptor};
pub use orchestrator::{BatchOrchestrator, BatchReport, RoundSummary};
pub use worker::{execute_job, ClipBackend, ProcessClipBackend};

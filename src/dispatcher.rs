//! # Dispatcher
//!
//! ## Architecture: Bounded Pool with a Collection Barrier
//!
//! A *round* runs every job for one target dataset. The dispatcher:
//!
//! 1. **Provisions** a pool of `parallelism` execution slots (a semaphore) and
//!    lets the backend prepare itself.
//! 2. **Dispatches** every job at once, in job-list order. Each job waits for a
//!    slot and then runs [`execute_job`] on a blocking thread.
//! 3. **Collects** one outcome per job. Handles are awaited in submission order,
//!    so `outcomes[i]` always belongs to `jobs[i]`, whatever the completion order.
//! 4. **Reports** the failure count. Failed jobs never cancel their siblings and
//!    never abort the round.
//!
//! The pool is dropped at the end of the round; the next round gets a fresh one.
//! Parallelism is detected once, when the dispatcher is built, and then fixed
//! for the batch.
//!
//! There is no timeout: a hung worker stalls its round.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::dataset::DatasetRef;
use crate::error::{BatchError, BatchResult, WorkerFault};
use crate::jobs::JobDescriptor;
use crate::worker::{execute_job, outcome_from, ClipBackend};

/// Lifecycle of the dispatcher within one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Idle,
    Provisioned,
    Dispatching,
    Collecting,
    Reported,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundState::Idle => "idle",
            RoundState::Provisioned => "provisioned",
            RoundState::Dispatching => "dispatching",
            RoundState::Collecting => "collecting",
            RoundState::Reported => "reported",
        };
        f.write_str(name)
    }
}

/// A job together with its success flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub job: JobDescriptor,
    pub success: bool,
}

/// Result of one fully collected round
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub target: DatasetRef,
    /// Number of jobs handed to the pool
    pub submitted: usize,
    /// One entry per submitted job, in submission order
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl RoundReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    /// Jobs whose worker returned `false`
    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.outcomes.iter().filter(|o| !o.success).map(|o| &o.job)
    }

    /// Every submitted job has exactly one outcome
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.submitted
    }
}

/// Runs rounds of clip jobs on a bounded pool
pub struct Dispatcher {
    backend: Arc<dyn ClipBackend>,
    parallelism: usize,
    state: Mutex<RoundState>,
}

impl Dispatcher {
    /// Create a dispatcher sized to the host's logical core count
    pub fn new(backend: Arc<dyn ClipBackend>) -> Self {
        let parallelism = detect_parallelism();
        info!(
            cpu_cores = parallelism,
            "Detected logical cores for worker pool"
        );
        Self::with_parallelism(backend, parallelism)
    }

    /// Create a dispatcher with an explicit pool size (at least one slot)
    pub fn with_parallelism(backend: Arc<dyn ClipBackend>, parallelism: usize) -> Self {
        Self {
            backend,
            parallelism: parallelism.max(1),
            state: Mutex::new(RoundState::Idle),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn state(&self) -> RoundState {
        *self.state.lock()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Run every job for `target` and wait for all outcomes
    ///
    /// Returns `Err` only when the pool cannot be provisioned; in that case no
    /// job has been started. An empty job list completes immediately without
    /// provisioning.
    #[instrument(skip(self, target, jobs), fields(target_dataset = %target, job_count = jobs.len()))]
    pub async fn dispatch_round(
        &self,
        target: &DatasetRef,
        jobs: Vec<JobDescriptor>,
    ) -> BatchResult<RoundReport> {
        let started = Instant::now();
        let submitted = jobs.len();

        if jobs.is_empty() {
            debug!("Empty job list, round completes immediately");
            self.transition(RoundState::Reported);
            self.transition(RoundState::Idle);
            return Ok(RoundReport {
                target: target.clone(),
                submitted,
                outcomes: Vec::new(),
                elapsed: started.elapsed(),
            });
        }

        let pool = self.provision().await?;

        info!(
            target_dataset = %target,
            jobs = submitted,
            slots = self.parallelism,
            "Sending jobs to pool"
        );
        self.transition(RoundState::Dispatching);

        let handles: Vec<_> = jobs
            .iter()
            .cloned()
            .map(|job| {
                let pool = Arc::clone(&pool);
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move { run_in_slot(pool, backend, job).await })
            })
            .collect();

        self.transition(RoundState::Collecting);

        let results = futures::future::join_all(handles).await;
        let outcomes: Vec<JobOutcome> = jobs
            .into_iter()
            .zip(results)
            .map(|(job, joined)| {
                let success = match joined {
                    Ok(success) => success,
                    Err(e) => outcome_from(Err(WorkerFault::Join(e.to_string())), &job),
                };
                JobOutcome { job, success }
            })
            .collect();

        drop(pool);

        let report = RoundReport {
            target: target.clone(),
            submitted,
            outcomes,
            elapsed: started.elapsed(),
        };
        self.transition(RoundState::Reported);

        let failed = report.failed_count();
        if failed > 0 {
            warn!(
                target_dataset = %target,
                failed = failed,
                submitted = submitted,
                "{failed} workers failed in {target} dataset"
            );
        }
        info!(
            target_dataset = %target,
            submitted = submitted,
            succeeded = report.succeeded_count(),
            failed = failed,
            duration_ms = report.elapsed.as_millis() as u64,
            "Finished clipping {target} dataset"
        );

        self.transition(RoundState::Idle);
        Ok(report)
    }

    async fn provision(&self) -> BatchResult<Arc<Semaphore>> {
        let backend = Arc::clone(&self.backend);
        let provisioned = tokio::task::spawn_blocking(move || backend.provision())
            .await
            .map_err(|e| BatchError::pool_provisioning(format!("provisioning task failed: {e}")))
            .and_then(|result| result);

        if let Err(e) = provisioned {
            self.transition(RoundState::Idle);
            return Err(e);
        }

        self.transition(RoundState::Provisioned);
        Ok(Arc::new(Semaphore::new(self.parallelism)))
    }

    fn transition(&self, to: RoundState) {
        let mut state = self.state.lock();
        debug!(from = %*state, to = %to, "Dispatcher state transition");
        *state = to;
    }
}

/// Wait for a pool slot, then run the job on a blocking thread
async fn run_in_slot(pool: Arc<Semaphore>, backend: Arc<dyn ClipBackend>, job: JobDescriptor) -> bool {
    let _permit = match pool.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            return outcome_from(
                Err(WorkerFault::Join(format!("pool closed before job started: {e}"))),
                &job,
            )
        }
    };

    let slot_job = job.clone();
    match tokio::task::spawn_blocking(move || execute_job(backend.as_ref(), &slot_job)).await {
        Ok(success) => success,
        Err(e) => outcome_from(Err(WorkerFault::Join(e.to_string())), &job),
    }
}

/// Logical core count of the host, or 1 when it cannot be determined
pub fn detect_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

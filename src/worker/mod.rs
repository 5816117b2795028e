//! # Worker Boundary
//!
//! The geospatial clip itself is delegated to a [`ClipBackend`]. The
//! orchestrator never calls a backend directly; it goes through
//! [`execute_job`], which reduces every possible result of a job to a single
//! `bool`:
//!
//! | backend result            | outcome |
//! |---------------------------|---------|
//! | `Ok(true)`                | `true`  |
//! | `Ok(false)`               | `false` |
//! | `Err(WorkerFault)`        | `false` |
//! | panic inside the backend  | `false` |
//!
//! Faults are logged here with the job's identity and then dropped, so the
//! dispatcher only ever sees booleans.

pub mod process;

use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, warn};

use crate::error::{BatchResult, WorkerFault};
use crate::jobs::JobDescriptor;

pub use process::ProcessClipBackend;

/// External clip-and-write operation
///
/// `clip` is a blocking call. It is always run on a blocking execution slot,
/// never on the async runtime's worker threads.
pub trait ClipBackend: Send + Sync {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    /// Prepare the backend before a round is dispatched
    ///
    /// An error here is a pool provisioning failure for the round.
    fn provision(&self) -> BatchResult<()> {
        Ok(())
    }

    /// Clip `job.target` by boundary feature `job.identifier`, writing
    /// `job.output_path`. `Ok(false)` means the backend ran and reported failure.
    fn clip(&self, job: &JobDescriptor) -> Result<bool, WorkerFault>;
}

/// Run one job and convert every failure mode into `false`
pub fn execute_job(backend: &dyn ClipBackend, job: &JobDescriptor) -> bool {
    let result = catch_unwind(AssertUnwindSafe(|| backend.clip(job)))
        .unwrap_or_else(|payload| Err(WorkerFault::from_panic(payload)));

    outcome_from(result, job)
}

/// Log and flatten a job result
pub(crate) fn outcome_from(result: Result<bool, WorkerFault>, job: &JobDescriptor) -> bool {
    match result {
        Ok(true) => {
            debug!(
                target_dataset = %job.target,
                identifier = %job.identifier,
                output = %job.output_path.display(),
                "Clip job succeeded"
            );
            true
        }
        Ok(false) => {
            warn!(
                target_dataset = %job.target,
                identifier = %job.identifier,
                "Clip backend reported failure"
            );
            false
        }
        Err(fault @ (WorkerFault::Panicked(_) | WorkerFault::Join(_))) => {
            error!(
                target_dataset = %job.target,
                identifier = %job.identifier,
                error = %fault,
                "Unhandled worker fault converted to failed outcome"
            );
            false
        }
        Err(fault) => {
            warn!(
                target_dataset = %job.target,
                identifier = %job.identifier,
                error = %fault,
                "Clip job failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetRef;
    use crate::jobs::JobBuilder;

    struct ScriptedBackend;

    impl ClipBackend for ScriptedBackend {
        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        fn clip(&self, job: &JobDescriptor) -> Result<bool, WorkerFault> {
            match job.identifier.to_string().as_str() {
                "1" => Ok(true),
                "2" => Ok(false),
                "3" => Err(WorkerFault::Backend("topology exception".to_string())),
                "4" => Err(std::io::Error::other("disk full").into()),
                _ => panic!("backend crashed"),
            }
        }
    }

    fn job(id: i64) -> JobDescriptor {
        let builder = JobBuilder::new(DatasetRef::from("States"), "id", "/tmp/out", "shp");
        builder
            .build(&[id.into()], &DatasetRef::from("Roads"))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_success_maps_to_true() {
        assert!(execute_job(&ScriptedBackend, &job(1)));
    }

    #[test]
    fn test_every_failure_mode_maps_to_false() {
        assert!(!execute_job(&ScriptedBackend, &job(2)));
        assert!(!execute_job(&ScriptedBackend, &job(3)));
        assert!(!execute_job(&ScriptedBackend, &job(4)));
    }

    #[test]
    fn test_panic_is_contained() {
        assert!(!execute_job(&ScriptedBackend, &job(5)));
        // The boundary is reusable after a panic
        assert!(execute_job(&ScriptedBackend, &job(1)));
    }

    #[test]
    fn test_default_provision_is_ok() {
        assert!(ScriptedBackend.provision().is_ok());
    }
}

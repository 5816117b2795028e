//! Mock Clip Backend for Testing
//!
//! Provides a `ClipBackend` that writes a small marker file instead of
//! running a geospatial clip, records every call, and fails or panics on
//! request.

#![allow(dead_code)]

use clip_batch::{BatchError, BatchResult, ClipBackend, Identifier, JobDescriptor, WorkerFault};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock treats one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    ReportFailure,
    Fault,
    Panic,
}

/// Calls observed by the mock
#[derive(Debug, Default, Clone)]
pub struct MockBackendState {
    /// (target, identifier) of every clip call
    pub calls: Vec<(String, Identifier)>,
    /// Output files written
    pub written: Vec<PathBuf>,
    pub provision_calls: usize,
}

pub struct MockBackend {
    state: Arc<Mutex<MockBackendState>>,
    report_failure: HashSet<Identifier>,
    fault: HashSet<Identifier>,
    panic: HashSet<Identifier>,
    unprovisionable_rounds: Mutex<usize>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockBackendState::default())),
            report_failure: HashSet::new(),
            fault: HashSet::new(),
            panic: HashSet::new(),
            unprovisionable_rounds: Mutex::new(0),
            delay: None,
        }
    }

    pub fn with_behavior(mut self, id: impl Into<Identifier>, behavior: Behavior) -> Self {
        let id = id.into();
        match behavior {
            Behavior::Succeed => {}
            Behavior::ReportFailure => {
                self.report_failure.insert(id);
            }
            Behavior::Fault => {
                self.fault.insert(id);
            }
            Behavior::Panic => {
                self.panic.insert(id);
            }
        }
        self
    }

    /// The next `rounds` provisioning attempts fail
    pub fn failing_provisioning(self, rounds: usize) -> Self {
        *self.unprovisionable_rounds.lock().unwrap() = rounds;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn state(&self) -> MockBackendState {
        self.state.lock().unwrap().clone()
    }
}

impl ClipBackend for MockBackend {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn provision(&self) -> BatchResult<()> {
        self.state.lock().unwrap().provision_calls += 1;
        let mut remaining = self.unprovisionable_rounds.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(BatchError::pool_provisioning("mock worker unavailable"));
        }
        Ok(())
    }

    fn clip(&self, job: &JobDescriptor) -> Result<bool, WorkerFault> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push((job.target.name().to_string(), job.identifier.clone()));

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.panic.contains(&job.identifier) {
            panic!("mock backend crash on {}", job.identifier);
        }
        if self.fault.contains(&job.identifier) {
            return Err(WorkerFault::Backend(format!("invalid geometry {}", job.identifier)));
        }
        if self.report_failure.contains(&job.identifier) {
            return Ok(false);
        }

        std::fs::write(
            &job.output_path,
            format!("{} clipped by {} {}\n", job.target, job.id_field, job.identifier),
        )?;
        self.state.lock().unwrap().written.push(job.output_path.clone());
        Ok(true)
    }
}

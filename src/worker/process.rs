//! # Process-Isolated Clip Backend
//!
//! Runs every clip job in its own OS process so that a non-reentrant
//! geospatial library never shares state between jobs. The worker executable
//! is invoked as:
//!
//! ```text
//! <executable> [args...] <boundary> <target> <id_field> <identifier> <output_path>
//! ```
//!
//! from the workspace directory. Exit status 0 means success.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::ClipBackend;
use crate::error::{BatchError, BatchResult, WorkerFault};
use crate::jobs::JobDescriptor;

/// Executable looked up on `PATH` when none is configured
pub const DEFAULT_WORKER_PROGRAM: &str = "clip-worker";

/// Longest stderr excerpt kept in a failure diagnostic
const MAX_STDERR_EXCERPT: usize = 512;

#[derive(Debug)]
pub struct ProcessClipBackend {
    configured: Option<PathBuf>,
    args: Vec<String>,
    working_dir: PathBuf,
    resolved: OnceLock<PathBuf>,
}

impl ProcessClipBackend {
    pub fn new(executable: Option<PathBuf>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            configured: executable,
            args,
            working_dir: working_dir.into(),
            resolved: OnceLock::new(),
        }
    }

    /// Resolved executable, once provisioning has succeeded
    pub fn executable(&self) -> Option<&Path> {
        self.resolved.get().map(PathBuf::as_path)
    }

    fn resolve(&self) -> BatchResult<PathBuf> {
        match &self.configured {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(BatchError::pool_provisioning(format!(
                "worker executable {} does not exist",
                path.display()
            ))),
            None => find_on_path(DEFAULT_WORKER_PROGRAM, std::env::var_os("PATH")).ok_or_else(|| {
                BatchError::pool_provisioning(format!(
                    "no '{DEFAULT_WORKER_PROGRAM}' executable found on PATH"
                ))
            }),
        }
    }

    fn command(&self, executable: &Path, job: &JobDescriptor) -> Command {
        let mut cmd = Command::new(executable);
        cmd.args(&self.args)
            .arg(job.boundary.name())
            .arg(job.target.name())
            .arg(&job.id_field)
            .arg(job.identifier.to_string())
            .arg(&job.output_path)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ClipBackend for ProcessClipBackend {
    fn backend_name(&self) -> &'static str {
        "process"
    }

    fn provision(&self) -> BatchResult<()> {
        if let Some(path) = self.resolved.get() {
            debug!(executable = %path.display(), "Worker executable already resolved");
            return Ok(());
        }

        let path = self.resolve()?;
        info!(executable = %path.display(), "Resolved worker executable");
        let _ = self.resolved.set(path);
        Ok(())
    }

    fn clip(&self, job: &JobDescriptor) -> Result<bool, WorkerFault> {
        let executable = self
            .resolved
            .get()
            .ok_or_else(|| WorkerFault::Backend("backend was not provisioned".to_string()))?;

        let output = self.command(executable, job).output()?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(MAX_STDERR_EXCERPT).collect();
        warn!(
            identifier = %job.identifier,
            target_dataset = %job.target,
            status = %output.status,
            stderr = %excerpt,
            "Worker process exited unsuccessfully"
        );
        Ok(false)
    }
}

fn find_on_path(program: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let file_name = format!("{program}{}", std::env::consts::EXE_SUFFIX);
    std::env::split_paths(&path_var?)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

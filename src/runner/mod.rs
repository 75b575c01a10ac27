//! Runner module - Step execution abstraction layer
//!
//! This module provides a unified interface for running one pipeline step:
//! - `CommandSpec`: what to launch and where
//! - `Runner`: the trait the executor drives
//! - `ProcessRunner`: real child processes with a wall-clock timeout
//!
//! The runner module does NOT:
//! - Decide what a step's streams mean (output vs. feedback)
//! - Know about languages or workspaces

pub mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RunError;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Build from a launcher prefix (e.g. `["mono"]`) followed by the program and its args
    pub fn prefixed(prefix: Option<&str>, program: impl Into<String>) -> Self {
        match prefix {
            Some(launcher) => Self::new(launcher).with_args([program.into()]),
            None => Self::new(program),
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Execution status (raw, no interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program to completion
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Stdout content
    pub stdout: String,
    /// Stderr content
    pub stderr: String,
    /// Execution status
    pub status: RunStatus,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing one step
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command to completion, failing with `RunError::TimedOut` once `timeout` elapses
    async fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<RunOutcome, RunError>;
}

// Re-exports
pub use process::ProcessRunner;

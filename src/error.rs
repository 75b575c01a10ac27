//! Error types for the execution pipeline
//!
//! Every variant here is recovered by the executor and turned into in-band
//! feedback text. Nothing in this module is ever reported as a transport error.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Feedback text returned when any pipeline step exceeds its time budget
pub const TIMEOUT_MESSAGE: &str = "Execution timed out.";

/// Requested language is not in the supported set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// Failure while running a single step
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No command specified for execution")]
    EmptyCommand,

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {}ms", .after.as_millis())]
    TimedOut { program: String, after: Duration },
}

/// Failure anywhere in a request's pipeline
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Failed to write source file {}: {source}", .path.display())]
    WriteSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Run(#[from] RunError),
}

impl ExecutionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Run(RunError::TimedOut { .. }))
    }

    /// Text placed in `feedback` when this error ends a pipeline
    pub fn feedback(&self) -> String {
        if self.is_timeout() {
            TIMEOUT_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_message() {
        let err = UnsupportedLanguage("ruby".into());
        assert_eq!(err.to_string(), "Unsupported language: ruby");
    }

    #[test]
    fn test_timeout_feedback_is_fixed() {
        let err = ExecutionError::from(RunError::TimedOut {
            program: "java".into(),
            after: Duration::from_secs(10),
        });
        assert!(err.is_timeout());
        assert_eq!(err.feedback(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_spawn_feedback_describes_failure() {
        let err = ExecutionError::from(RunError::Spawn {
            program: "javac".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        assert!(!err.is_timeout());
        assert_eq!(err.feedback(), "Failed to spawn `javac`: not found");
    }
}

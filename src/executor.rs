//! Execution dispatcher
//!
//! Maps one `(code, language)` request onto a pipeline, runs it inside a fresh
//! workspace and folds every outcome, including failures, into the
//! `{output, feedback}` shape.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::ExecutionError;
use crate::languages::{Language, StepKind};
use crate::runner::{ProcessRunner, Runner};
use crate::workspace::Workspace;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Standard output of every run step
    pub output: String,
    /// Compiler messages, standard error and synthetic diagnostics
    pub feedback: String,
}

impl ExecutionResult {
    pub fn feedback_only(feedback: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            feedback: feedback.into(),
        }
    }

    fn trimmed(self) -> Self {
        Self {
            output: self.output.trim().to_string(),
            feedback: self.feedback.trim().to_string(),
        }
    }
}

/// Runs requests; holds only immutable state, so one instance serves all requests
#[derive(Clone)]
pub struct Executor {
    config: Arc<ExecutorConfig>,
    runner: Arc<dyn Runner>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new()))
    }

    pub fn with_runner(config: ExecutorConfig, runner: Arc<dyn Runner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    /// Execute a request. Never fails: every error becomes feedback text.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        info!(
            "Received execution request: language={}, code_len={}",
            request.language,
            request.code.len()
        );

        let language = match request.language.parse::<Language>() {
            Ok(language) => language,
            Err(e) => {
                info!("Rejected request: {}", e);
                return ExecutionResult::feedback_only(e.to_string());
            }
        };

        let result = match self.execute_in_workspace(language, &request.code).await {
            Ok(result) => result,
            Err(e) if e.is_timeout() => {
                warn!("Execution of {} snippet timed out: {}", language, e);
                ExecutionResult::feedback_only(e.feedback())
            }
            Err(e) => {
                error!("Execution of {} snippet failed: {}", language, e);
                ExecutionResult::feedback_only(e.feedback())
            }
        };

        info!(
            "Execution completed: language={}, output_len={}, feedback_len={}",
            language,
            result.output.len(),
            result.feedback.len()
        );
        result.trimmed()
    }

    async fn execute_in_workspace(
        &self,
        language: Language,
        code: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let workspace = Workspace::acquire(self.config.workspace_root.as_deref())
            .map_err(ExecutionError::Workspace)?;

        let result = self.run_pipeline(&workspace, language, code).await;

        if let Err(e) = workspace.release() {
            warn!("Failed to remove workspace: {}", e);
        }

        result
    }

    async fn run_pipeline(
        &self,
        workspace: &Workspace,
        language: Language,
        code: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let pipeline = language.pipeline(code, &self.config.toolchain, workspace.path());

        workspace
            .write_file(language.source_file_name(), &pipeline.source)
            .await
            .map_err(|source| ExecutionError::WriteSource {
                path: pipeline.source_file.clone(),
                source,
            })?;

        let mut result = ExecutionResult::default();

        for step in &pipeline.steps {
            let outcome = self
                .runner
                .run(&step.command, self.config.step_timeout)
                .await?;

            match step.kind {
                StepKind::Compile => {
                    // Some compilers (csc, vbc) report diagnostics on stdout
                    result.feedback.push_str(&outcome.stderr);
                    result.feedback.push_str(&outcome.stdout);

                    if !outcome.is_success() {
                        debug!(
                            "Compilation failed with {:?}, skipping run step",
                            outcome.status
                        );
                        break;
                    }
                }
                StepKind::Run => {
                    result.output.push_str(&outcome.stdout);
                    result.feedback.push_str(&outcome.stderr);
                }
            }
        }

        Ok(result)
    }
}

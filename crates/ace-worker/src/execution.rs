// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! How a module's `execute_analysis` actually gets run: in the same task
//! (the common case), or in an isolated OS process for modules the registry
//! flags `is_multi_process` (per §9 DESIGN NOTES "Async vs. isolated
//! modules" — e.g. a module loading a large ruleset whose crash or hang must
//! not take the whole worker down with it).

use crate::module::{AnalysisModule, ModuleError};
use ace_core::{Analysis, ObservableIdx, RootAnalysis};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// The result of running one module against one observable, with timeout and
/// crash handling already folded in.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed(Analysis),
    Failed(ModuleError),
    TimedOut,
}

/// How a [`crate::manager::WorkerManager`] actually invokes a registered
/// [`AnalysisModule`].
#[async_trait]
pub trait ExecutionStrategy: Send + Sync + 'static {
    async fn execute(
        &self,
        module: &dyn AnalysisModule,
        root: &RootAnalysis,
        observable: ObservableIdx,
        timeout: Duration,
    ) -> ExecutionOutcome;
}

/// Run the module in-process, under a `tokio::time::timeout`. The default
/// and only strategy for modules that don't set `is_multi_process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InTaskStrategy;

#[async_trait]
impl ExecutionStrategy for InTaskStrategy {
    async fn execute(&self, module: &dyn AnalysisModule, root: &RootAnalysis, observable: ObservableIdx, timeout: Duration) -> ExecutionOutcome {
        match tokio::time::timeout(timeout, module.execute_analysis(root, observable)).await {
            Ok(Ok(analysis)) => ExecutionOutcome::Completed(analysis),
            Ok(Err(err)) => ExecutionOutcome::Failed(err),
            Err(_) => ExecutionOutcome::TimedOut,
        }
    }
}

#[derive(Serialize)]
struct ProcessRequest<'a> {
    root: &'a RootAnalysis,
    observable: ObservableIdx,
}

#[derive(Deserialize)]
struct ProcessResponse {
    analysis: Option<Analysis>,
    error: Option<String>,
}

/// Run the module as a fresh child process: `program <amt-name>`, the
/// request JSON written to stdin, the response JSON read back from stdout.
///
/// A non-zero exit, a spawn failure, or output that doesn't parse is
/// recorded as a [`ModuleError`] the same way an in-task panic would be,
/// rather than propagated; the module's own process, not this strategy, is
/// responsible for catching its own panics and reporting them as `error`.
pub struct IsolatedProcessStrategy {
    program: PathBuf,
}

impl IsolatedProcessStrategy {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    async fn run(&self, module: &dyn AnalysisModule, root: &RootAnalysis, observable: ObservableIdx) -> Result<ExecutionOutcome, ModuleError> {
        let payload = serde_json::to_vec(&ProcessRequest { root, observable })
            .map_err(|err| ModuleError::new(format!("failed to serialize request: {err}")))?;

        let amt_name = module.analysis_module_type().name;
        let mut child = Command::new(&self.program)
            .arg(&amt_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ModuleError::new(format!("failed to spawn {}: {err}", self.program.display())))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ModuleError::new(format!("spawned {} without a piped stdin", self.program.display())))?;
        stdin
            .write_all(&payload)
            .await
            .map_err(|err| ModuleError::new(format!("failed to write request: {err}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ModuleError::new(format!("failed to wait on child process: {err}")))?;

        if !output.status.success() {
            return Ok(ExecutionOutcome::Failed(ModuleError::with_stack_trace(
                format!("module process for {amt_name} exited with {}", output.status),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )));
        }

        let response: ProcessResponse = serde_json::from_slice(&output.stdout)
            .map_err(|err| ModuleError::new(format!("failed to parse module process output: {err}")))?;

        match (response.analysis, response.error) {
            (Some(analysis), _) => Ok(ExecutionOutcome::Completed(analysis)),
            (None, Some(error)) => Ok(ExecutionOutcome::Failed(ModuleError::new(error))),
            (None, None) => Ok(ExecutionOutcome::Failed(ModuleError::new("module process returned neither an analysis nor an error"))),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for IsolatedProcessStrategy {
    async fn execute(&self, module: &dyn AnalysisModule, root: &RootAnalysis, observable: ObservableIdx, timeout: Duration) -> ExecutionOutcome {
        match tokio::time::timeout(timeout, self.run(module, root, observable)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => ExecutionOutcome::Failed(err),
            Err(_) => ExecutionOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;

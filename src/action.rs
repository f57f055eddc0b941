//! Runs the configured action script for a branch

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, WebhookError};
use crate::utils::is_executable;

/// Starts the action script and waits for it, returning everything it wrote.
#[async_trait]
pub trait ActionLauncher: Send + Sync {
    async fn launch(&self, script: &Path, branch: &str) -> io::Result<Output>;
}

/// Launches the script as a child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl ActionLauncher for ProcessLauncher {
    async fn launch(&self, script: &Path, branch: &str) -> io::Result<Output> {
        // output() reads stdout and stderr to EOF before reaping the child
        Command::new(script)
            .arg(branch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
    }
}

/// One finished run of the action script.
#[derive(Debug, Clone)]
pub struct ActionInvocation {
    pub branch: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ActionInvocation {
    fn from_output(
        branch: &str,
        output: Output,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            branch: branch.to_string(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            duration,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// Script missing or lacking execute permission; nothing was launched.
    NotExecutable,
    Success(ActionInvocation),
    ScriptFailed(ActionInvocation),
}

impl ActionOutcome {
    /// Maps the outcome onto the handler's error taxonomy.
    pub fn into_result(self, script: &Path) -> Result<ActionInvocation> {
        match self {
            ActionOutcome::Success(invocation) => Ok(invocation),
            ActionOutcome::NotExecutable => {
                Err(WebhookError::ActionNotExecutable(script.to_path_buf()))
            }
            ActionOutcome::ScriptFailed(invocation) => Err(WebhookError::ActionFailed {
                exit_code: invocation.exit_code,
            }),
        }
    }
}

#[derive(Clone)]
pub struct ActionDispatcher {
    script_path: PathBuf,
    launcher: Arc<dyn ActionLauncher>,
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("script_path", &self.script_path)
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self::with_launcher(script_path, Arc::new(ProcessLauncher))
    }

    pub fn with_launcher(
        script_path: impl Into<PathBuf>,
        launcher: Arc<dyn ActionLauncher>,
    ) -> Self {
        Self {
            script_path: script_path.into(),
            launcher,
        }
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Runs the script with `branch` as its only argument and classifies the exit.
    ///
    /// A launch failure is returned as `ActionLaunchFailed`.
    pub async fn dispatch(&self, branch: &str) -> Result<ActionOutcome> {
        if !is_executable(&self.script_path) {
            return Ok(ActionOutcome::NotExecutable);
        }

        info!("Running: {} {}", self.script_path.display(), branch);
        let started_at = Utc::now();
        let timer = Instant::now();
        let output = self
            .launcher
            .launch(&self.script_path, branch)
            .await
            .map_err(WebhookError::ActionLaunchFailed)?;
        let invocation =
            ActionInvocation::from_output(branch, output, started_at, timer.elapsed());
        debug!(
            "Action for branch '{}' exited with {:?} after {:?}",
            branch, invocation.exit_code, invocation.duration
        );

        if invocation.exit_code == Some(0) {
            Ok(ActionOutcome::Success(invocation))
        } else {
            Ok(ActionOutcome::ScriptFailed(invocation))
        }
    }
}

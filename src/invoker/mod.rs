//! Process invocation seam between the supervision layer and the runtime tool.
//!
//! Every invocation, including a failed launch, comes back as an
//! [`Invocation`] value. Callers must treat "the tool ran and said no" the
//! same way as "the tool produced unexpected output", so non-zero exits are
//! data, not an error control path.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

/// Fallback path used when the configured binary cannot be launched.
pub const DEFAULT_TOOL_PATH: &str = "/usr/local/bin/container";

/// Wrapper used for commands that need elevated privileges (DNS changes).
const ELEVATION_WRAPPER: &str = "sudo";

/// Structured outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub failed: bool,
}

impl Invocation {
    /// Build from a completed process output.
    pub fn from_output(output: &std::process::Output) -> Self {
        let exit_code = output.status.code();
        Self {
            exit_code,
            stdout: Some(String::from_utf8_lossy(&output.stdout).to_string()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            failed: !output.status.success(),
        }
    }

    /// Build for a binary that could not be launched at all.
    ///
    /// `stdout` is `None` here, which is how launch failures stay
    /// distinguishable from a clean non-zero exit without a separate type.
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            stdout: None,
            stderr: Some(reason.into()),
            failed: true,
        }
    }

    /// Best diagnostic line available for logs and user-facing messages.
    pub fn diagnostic(&self) -> String {
        let from_stderr = self
            .stderr
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let from_stdout = self
            .stdout
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match from_stderr.or(from_stdout) {
            Some(line) => line.lines().next().unwrap_or(line).to_string(),
            None => format!("command exited with status {:?}", self.exit_code),
        }
    }
}

/// Async seam for issuing tool commands.
///
/// Implementations never return an error: launch problems are encoded in the
/// returned [`Invocation`] so caller logic stays uniform.
#[async_trait]
pub trait CliInvoker: Send + Sync {
    async fn invoke(&self, args: &[&str]) -> Invocation;

    /// Privileged variant for commands that mutate host-level resources.
    async fn invoke_privileged(&self, args: &[&str]) -> Invocation;
}

/// Production invoker that spawns the external runtime tool.
pub struct ToolInvoker {
    tool_path: PathBuf,
    fallback_warned: AtomicBool,
}

impl ToolInvoker {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            fallback_warned: AtomicBool::new(false),
        }
    }

    pub fn tool_path(&self) -> &PathBuf {
        &self.tool_path
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<Invocation, std::io::Error> {
        debug!("Invoking {} {}", program, args.join(" "));
        let output = AsyncCommand::new(program).args(args).output().await?;
        Ok(Invocation::from_output(&output))
    }

    async fn run_with_fallback(&self, args: &[&str], privileged: bool) -> Invocation {
        let configured = self.tool_path.display().to_string();

        let attempt = if privileged {
            let mut wrapped = vec![configured.as_str()];
            wrapped.extend_from_slice(args);
            self.run(ELEVATION_WRAPPER, &wrapped).await
        } else {
            self.run(&configured, args).await
        };

        let spawn_error = match attempt {
            Ok(invocation) => return invocation,
            Err(error) => error,
        };

        if configured != DEFAULT_TOOL_PATH {
            if !self.fallback_warned.swap(true, Ordering::Relaxed) {
                warn!(
                    "Tool at {} could not be launched ({}); falling back to {}",
                    configured, spawn_error, DEFAULT_TOOL_PATH
                );
            }

            let fallback = if privileged {
                let mut wrapped = vec![DEFAULT_TOOL_PATH];
                wrapped.extend_from_slice(args);
                self.run(ELEVATION_WRAPPER, &wrapped).await
            } else {
                self.run(DEFAULT_TOOL_PATH, args).await
            };

            if let Ok(invocation) = fallback {
                return invocation;
            }
        }

        Invocation::launch_failure(format!(
            "failed to launch {}: {}",
            configured, spawn_error
        ))
    }
}

#[async_trait]
impl CliInvoker for ToolInvoker {
    async fn invoke(&self, args: &[&str]) -> Invocation {
        self.run_with_fallback(args, false).await
    }

    async fn invoke_privileged(&self, args: &[&str]) -> Invocation {
        self.run_with_fallback(args, true).await
    }
}

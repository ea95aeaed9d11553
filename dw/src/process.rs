//! External process adapter
//!
//! Runs a program with captured output and a hard timeout, mapping spawn
//! failures, timeouts and non-zero exits onto [`CompileError`].
//!
//! Template helpers render synchronously, so [`ExternalCommand::run`] blocks
//! on the async implementation. It must be called from a blocking context
//! (a `spawn_blocking` task or a thread with no runtime), never from async code.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tracing::debug;

use crate::error::{CompileError, Result};

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A single invocation of an external program
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run to completion from synchronous code
    ///
    /// Uses the ambient runtime when there is one, otherwise a private
    /// current-thread runtime.
    pub fn run(&self) -> Result<ProcessOutput> {
        match Handle::try_current() {
            Ok(handle) => handle.block_on(self.output()),
            Err(_) => {
                debug!(program = %self.program, "ExternalCommand::run: no runtime, building one");
                let runtime = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|source| CompileError::ProcessSpawn {
                        program: self.program.clone(),
                        source,
                    })?;
                runtime.block_on(self.output())
            }
        }
    }

    /// Run to completion, failing on timeout or non-zero exit
    pub async fn output(&self) -> Result<ProcessOutput> {
        debug!(program = %self.program, args = ?self.args, cwd = ?self.cwd, timeout_ms = self.timeout.as_millis() as u64, "ExternalCommand::output: called");
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                debug!(error = %source, "ExternalCommand::output: spawn failed");
                return Err(CompileError::ProcessSpawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                debug!(program = %self.program, "ExternalCommand::output: timed out");
                return Err(CompileError::ProcessTimeout {
                    program: self.program.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let captured = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(status = ?output.status, stdout_len = captured.stdout.len(), stderr_len = captured.stderr.len(), "ExternalCommand::output: finished");

        if output.status.success() {
            Ok(captured)
        } else {
            Err(CompileError::ProcessFailed {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                output: combined(&captured),
            })
        }
    }
}

fn combined(output: &ProcessOutput) -> String {
    let stdout = output.stdout.trim_end();
    let stderr = output.stderr.trim_end();
    if stdout.is_empty() {
        stderr.to_string()
    } else if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\nSTDERR:\n{}", stdout, stderr)
    }
}

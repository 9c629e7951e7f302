//! Process runner - launches one external command and classifies its exit.
//!
//! stdout is relayed chunk by chunk as it is read, so long repairs show live
//! progress. stderr is drained in parallel and only kept for failure
//! diagnostics. There is no timeout and no retry.
//!
//! Spawning goes through [`ProcessLauncher`] so the OS can be swapped for a
//! scripted process in tests.

use crate::relay::OutputRelay;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use tidy_common::{OutputChunk, ProcessSpec, Result, ResultPolicy, RunOutcome, TidyError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 4096;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Resolves to the exit code, `None` when killed by a signal
pub type ExitFuture = Pin<Box<dyn Future<Output = io::Result<Option<i32>>> + Send>>;

/// A started process: its two output pipes and its eventual exit.
///
/// Dropping `exit` before it resolves must stop the process.
pub struct LaunchedProcess {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    pub exit: ExitFuture,
}

/// Starts external programs
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &ProcessSpec) -> io::Result<LaunchedProcess>;
}

/// Launches real OS processes with tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, spec: &ProcessSpec) -> io::Result<LaunchedProcess> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr was not captured"))?;

        Ok(LaunchedProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit: Box::pin(async move { child.wait().await.map(|status| status.code()) }),
        })
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Clone)]
pub struct ProcessRunner {
    relay: Arc<OutputRelay>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ProcessRunner {
    pub fn new(relay: Arc<OutputRelay>) -> Self {
        Self::with_launcher(relay, Arc::new(SystemLauncher))
    }

    pub fn with_launcher(relay: Arc<OutputRelay>, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { relay, launcher }
    }

    /// Run `spec` to completion and turn the result into an outcome
    pub async fn run(&self, spec: &ProcessSpec, success_message: &str) -> RunOutcome {
        match self.execute(spec).await {
            Ok(exit) => classify(spec, success_message, exit),
            Err(e) => {
                if let TidyError::Launch { source, .. } = &e {
                    warn!(
                        "Could not launch {} ({:?}): {}",
                        spec.program,
                        source.kind(),
                        source
                    );
                } else {
                    warn!("Running {} failed: {}", spec.program, e);
                }
                RunOutcome::from_error(&e)
            }
        }
    }

    /// Spawn, stream stdout to the relay, collect stderr, wait for exit
    pub async fn execute(&self, spec: &ProcessSpec) -> Result<ProcessExit> {
        info!("Executing: {} {:?}", spec.program, spec.args);

        let process = self.launcher.launch(spec).map_err(|source| TidyError::Launch {
            program: spec.program.clone(),
            source,
        })?;
        let LaunchedProcess { stdout, stderr, exit } = process;

        let stderr_task = tokio::spawn(read_to_string_lossy(stderr));
        let stdout = match self.relay_stdout(&spec.program, stdout).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!("Lost stdout of {}, stopping it: {}", spec.program, e);
                stderr_task.abort();
                drop(exit);
                return Err(e);
            }
        };
        let stderr = stderr_task
            .await
            .map_err(|e| TidyError::Internal(format!("stderr reader: {}", e)))??;

        let code = exit.await?;
        info!("{} exited with code {:?}", spec.program, code);

        Ok(ProcessExit {
            code,
            stdout,
            stderr,
        })
    }

    async fn relay_stdout<R: AsyncRead + Unpin>(&self, program: &str, mut stdout: R) -> Result<String> {
        let mut buf = [0u8; READ_CHUNK];
        let mut pending: Vec<u8> = Vec::new();
        let mut collected = String::new();

        loop {
            let n = stdout.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&buf[..n]);
            let text = take_complete_utf8(&mut pending);
            if !text.is_empty() {
                debug!("{}: {}", program, text.trim_end());
                collected.push_str(&text);
                self.relay.publish(OutputChunk::new(text));
            }
        }

        // Stream ended inside a multi-byte sequence
        if !pending.is_empty() {
            let text = String::from_utf8_lossy(&pending).into_owned();
            collected.push_str(&text);
            self.relay.publish(OutputChunk::new(text));
        }

        Ok(collected)
    }
}

/// Exit-code classification for a finished process
pub fn classify(spec: &ProcessSpec, success_message: &str, exit: ProcessExit) -> RunOutcome {
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };

    if spec.policy == ResultPolicy::LaunchOnly {
        let output = spec.launch_note.clone().or_else(|| non_empty(exit.stdout));
        return RunOutcome::succeeded(success_message, output);
    }

    match exit.code {
        Some(code) if code == spec.success_exit_code => {
            RunOutcome::succeeded(success_message, Some(exit.stdout))
        }
        Some(code) if code == spec.privileged_exit_code => {
            warn!("{} needs elevation (exit {})", spec.program, code);
            RunOutcome::from_error(&TidyError::ElevationRequired)
        }
        code => {
            let code = code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            warn!("{} failed with code {}", spec.program, code);
            RunOutcome::from_error(&TidyError::ExternalProcessFailure {
                program: spec.program.clone(),
                code,
                stderr: exit.stderr,
            })
        }
    }
}

/// Split off the longest valid UTF-8 prefix, keeping a trailing partial
/// sequence in `pending` for the next read.
fn take_complete_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(s) => {
            let text = s.to_string();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            text
        }
    }
}

async fn read_to_string_lossy<R: AsyncRead + Unpin>(mut reader: R) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

//! Helper process execution
//!
//! Runs `<program> [args...] <up|down> <config-path>` and classifies the
//! outcome. Exactly one outcome is produced per invocation: the first of
//! process exit, timeout, or termination request wins.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::HelperError;
use crate::profile::Direction;

/// Default helper executable
pub const DEFAULT_HELPER: &str = "wg-quick";

/// Default time allowed for one helper invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(25_000);

/// How long to wait for output pipes to drain after the process exited
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// How to invoke the privileged helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for HelperCommand {
    fn default() -> Self {
        Self::new(DEFAULT_HELPER)
    }
}

impl HelperCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before the direction token, e.g. `sudo` + `["wg-quick"]`
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the helper to completion.
    ///
    /// `on_spawn` receives the child's pid right after a successful spawn.
    /// A value received on `terminate` kills the process and yields
    /// `Cancelled`; a dropped sender is ignored.
    ///
    /// # Errors
    /// Returns a `HelperError` for every outcome other than exit code 0.
    pub async fn run(
        &self,
        direction: Direction,
        config_path: &str,
        mut terminate: oneshot::Receiver<()>,
        on_spawn: impl FnOnce(Option<u32>),
    ) -> Result<String, HelperError> {
        let mut child = self.spawn(direction, config_path)?;
        on_spawn(child.id());
        debug!(helper = %self.program, %direction, config_path, pid = ?child.id(), "helper spawned");

        let collector = collect_output(&mut child);
        let sleep = tokio::time::sleep(self.timeout);
        tokio::pin!(sleep);

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(HelperError::Spawn)?;
                let output = drain(collector).await;
                classify_exit(status, &output)?;
                Ok(output)
            }
            () = &mut sleep => {
                kill(&mut child).await;
                Err(HelperError::Timeout {
                    after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
            Ok(()) = &mut terminate => {
                kill(&mut child).await;
                Err(HelperError::Cancelled)
            }
        }
    }

    fn spawn(&self, direction: Direction, config_path: &str) -> Result<Child, HelperError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(direction.as_arg())
            .arg(config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HelperError::NotFound {
                        helper: self.program.clone(),
                    }
                } else {
                    HelperError::Spawn(e)
                }
            })
    }
}

fn classify_exit(status: ExitStatus, output: &str) -> Result<(), HelperError> {
    if status.success() {
        return Ok(());
    }

    let trimmed = output.trim();
    let message = if !trimmed.is_empty() {
        trimmed.to_string()
    } else if let Some(code) = status.code() {
        format!("Helper returned code {code}")
    } else {
        "Helper was terminated by a signal".to_string()
    };
    Err(HelperError::Exit {
        code: status.code(),
        message,
    })
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("failed to kill helper process: {e}");
    }
}

/// Read stdout and stderr concurrently into one buffer, in arrival order
fn collect_output(child: &mut Child) -> JoinHandle<String> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::spawn(async move {
        let mut combined = Vec::new();
        let mut out_buf = [0u8; 1024];
        let mut err_buf = [0u8; 1024];
        let mut stdout = stdout;
        let mut stderr = stderr;

        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                n = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match n {
                    Some(n) => combined.extend_from_slice(&out_buf[..n]),
                    None => stdout = None,
                },
                n = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match n {
                    Some(n) => combined.extend_from_slice(&err_buf[..n]),
                    None => stderr = None,
                },
            }
        }
        String::from_utf8_lossy(&combined).into_owned()
    })
}

/// Next chunk from a pipe; `None` at end of stream or on error
async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> Option<usize> {
    let reader = pipe.as_mut()?;
    match reader.read(buf).await {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

async fn drain(collector: JoinHandle<String>) -> String {
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, collector).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!("helper output collector failed: {e}");
            String::new()
        }
        Err(_) => {
            debug!("helper output still open after exit, ignoring the rest");
            String::new()
        }
    }
}

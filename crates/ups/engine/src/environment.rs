//! Local process execution environment

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};
use ups_types::{ExecutionEnvironment, ExecutionError, ExecutionReport, ResourceLimits};

/// Runs candidate code by piping it into an interpreter process.
///
/// The child is killed when the timeout elapses or the calling task is
/// aborted. Captured output is truncated to `max_output_bytes`.
#[derive(Clone, Debug)]
pub struct ProcessEnvironment {
    interpreter: String,
    args: Vec<String>,
}

impl ProcessEnvironment {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

#[async_trait]
impl ExecutionEnvironment for ProcessEnvironment {
    async fn execute(
        &self,
        code: &str,
        limits: &ResourceLimits,
    ) -> Result<ExecutionReport, ExecutionError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.args(&self.args)
            .envs(&limits.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ExecutionError::Spawn(format!("{}: {}", self.interpreter, e)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let max = limits.max_output_bytes;

        // Feeding stdin, draining both pipes and waiting all share one deadline.
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A runner that exits without reading its input is not an error.
                if let Err(e) = stdin.write_all(code.as_bytes()).await {
                    debug!(error = %e, "runner closed stdin early");
                }
            }
        };
        let run = async {
            let (_, stdout, stderr, status) =
                tokio::join!(feed, read_capped(stdout, max), read_capped(stderr, max), child.wait());
            Ok::<_, std::io::Error>((stdout?, stderr?, status?))
        };

        let timeout = Duration::from_millis(limits.timeout_ms);
        let (stdout, stderr, status) = match tokio::time::timeout(timeout, run).await {
            Ok(result) => result.map_err(|e| ExecutionError::Io(e.to_string()))?,
            Err(_) => {
                warn!(interpreter = %self.interpreter, timeout_ms = limits.timeout_ms, "execution timed out");
                return Err(ExecutionError::Timeout(limits.timeout_ms));
            }
        };

        Ok(ExecutionReport {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            produced_artifacts: Default::default(),
            exit_status: status.code(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Keep at most `max` bytes; the rest is drained and discarded so the child
/// never blocks on a full pipe.
async fn read_capped<R>(reader: Option<R>, max: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    (&mut reader).take(max as u64).read_to_end(&mut kept).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(kept)
}

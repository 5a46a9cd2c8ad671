//! Subprocess execution for training tasks.

use std::{collections::VecDeque, path::PathBuf, process::Stdio};

use tokio::{
    fs::OpenOptions,
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    process::Command,
};
use wbt_config::TrainerParams;

/// Lines of stderr retained for failure reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Result of one training invocation.
#[derive(Debug)]
pub struct RunOutcome {
    /// Motion name the invocation trained.
    pub motion: String,
    /// Whether the trainer exited with code 0.
    pub success: bool,
    /// Exit code if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Last stderr lines, for failure messages.
    pub stderr_tail: Vec<String>,
}

/// Launches the external trainer for one motion at a time.
pub struct TrainRunner {
    params: TrainerParams,
    /// Where captured trainer stdout/stderr ends up.
    log_dir: PathBuf,
}

impl TrainRunner {
    /// Create a new runner.
    #[must_use]
    pub fn new(params: TrainerParams, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            params,
            log_dir: log_dir.into(),
        }
    }

    /// Run training for a single motion on a specific GPU and wait for it.
    ///
    /// The GPU is pinned by setting `CUDA_VISIBLE_DEVICES` on the child's
    /// environment only; the dispatcher's own environment is never mutated.
    pub async fn run(&self, motion: &str, gpu_id: u32) -> Result<RunOutcome, RunError> {
        let args = self.params.to_cli_args(motion);
        tracing::debug!("spawning: {} {}", self.params.python, args.join(" "));

        let mut cmd = Command::new(&self.params.python);
        cmd.args(&args)
            .env("CUDA_VISIBLE_DEVICES", gpu_id.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref workdir) = self.params.workdir {
            cmd.current_dir(workdir);
        }
        let mut child = cmd
            .spawn()
            .map_err(|e| RunError::Spawn(motion.to_string(), e))?;

        let _ = tokio::fs::create_dir_all(&self.log_dir).await;
        let timestamp = now_timestamp();

        let stdout_task = child.stdout.take().map(|stdout| {
            let path = self.log_dir.join(format!("{motion}.stdout.log"));
            tokio::spawn(append_lines(stdout, path, timestamp.clone(), 0))
        });
        let stderr_task = child.stderr.take().map(|stderr| {
            let path = self.log_dir.join(format!("{motion}.stderr.log"));
            tokio::spawn(append_lines(stderr, path, timestamp, STDERR_TAIL_LINES))
        });

        let status = child
            .wait()
            .await
            .map_err(|e| RunError::Wait(motion.to_string(), e))?;

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(RunOutcome {
            motion: motion.to_string(),
            success: status.success(),
            exit_code: status.code(),
            stderr_tail,
        })
    }
}

/// Stream `stream` line-by-line into the log file at `path`, returning the
/// last `tail` lines.
///
/// When the file already has content from a previous invocation, a
/// timestamped separator is written first.
async fn append_lines<R>(stream: R, path: PathBuf, timestamp: String, tail: usize) -> Vec<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let reader = BufReader::new(stream);
    let mut lines = reader.lines();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .ok();

    if let Some(ref mut f) = file
        && f.metadata().await.is_ok_and(|m| m.len() > 0)
    {
        let _ = f
            .write_all(format!("\n--- run at {timestamp} ---\n\n").as_bytes())
            .await;
    }

    let mut kept = VecDeque::with_capacity(tail);
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(ref mut f) = file {
            let _ = f.write_all(line.as_bytes()).await;
            let _ = f.write_all(b"\n").await;
        }
        if tail > 0 {
            if kept.len() >= tail {
                kept.pop_front();
            }
            kept.push_back(line);
        }
    }
    kept.into_iter().collect()
}

/// Current time as a human-readable timestamp.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Errors that can occur when launching the trainer.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to spawn trainer for {0}: {1}")]
    Spawn(String, std::io::Error),
    #[error("failed to wait on trainer for {0}: {1}")]
    Wait(String, std::io::Error),
}

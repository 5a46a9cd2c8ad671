//! Per-GPU worker pull-loop.

use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::{Mutex, mpsc};

use crate::runner::TrainRunner;

/// A value delivered through the shared task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    /// Train this motion.
    Task(String),
    /// Stop pulling further tasks.
    Shutdown,
}

/// Shared end of the task queue. Workers take the lock only for the duration
/// of one dequeue, so the queue stays the sole synchronization point.
pub type TaskQueue = Arc<Mutex<mpsc::Receiver<QueueItem>>>;

/// Pull tasks until a shutdown sentinel arrives.
///
/// Each dequeued motion is trained synchronously on this worker's GPU. A
/// failed or unspawnable invocation is logged and the loop continues; nothing
/// is retried or re-queued.
pub async fn worker_loop(
    worker_id: usize,
    gpu_id: u32,
    queue: TaskQueue,
    runner: Arc<TrainRunner>,
    pb: ProgressBar,
) {
    loop {
        let item = { queue.lock().await.recv().await };
        let motion = match item {
            Some(QueueItem::Task(motion)) => motion,
            Some(QueueItem::Shutdown) | None => break,
        };

        pb.set_message(format!("worker {worker_id} [gpu {gpu_id}]: {motion}"));
        tracing::info!("[gpu {gpu_id}] starting training for: {motion}");

        match runner.run(&motion, gpu_id).await {
            Ok(outcome) if outcome.success => {
                tracing::info!("[gpu {gpu_id}] completed: {motion}");
            }
            Ok(outcome) => {
                if let Some(code) = outcome.exit_code {
                    tracing::error!("[gpu {gpu_id}] failed with code {code}: {motion}");
                } else {
                    tracing::error!("[gpu {gpu_id}] killed by signal: {motion}");
                }
                for line in &outcome.stderr_tail {
                    tracing::debug!("[gpu {gpu_id}] {motion} stderr: {line}");
                }
            }
            Err(e) => {
                tracing::error!("[gpu {gpu_id}] task {motion} failed: {e}");
            }
        }

        pb.set_message(format!("worker {worker_id} [gpu {gpu_id}]: idle"));
    }

    tracing::info!("[gpu {gpu_id}] no more work, shutting down");
    pb.finish_with_message(format!("worker {worker_id} [gpu {gpu_id}]: done"));
}

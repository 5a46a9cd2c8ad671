//! Task dispatch across the GPU worker pool.

use std::{sync::Arc, time::Duration};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::{Mutex, mpsc};

use crate::{
    runner::TrainRunner,
    worker::{self, QueueItem},
};

/// Fans tasks out over a fixed pool of per-GPU workers.
///
/// The pool size is `gpu_ids.len() * workers_per_gpu`; more than one worker
/// per GPU oversubscribes it, with no coordination on memory.
pub struct Dispatcher {
    gpu_ids: Vec<u32>,
    workers_per_gpu: usize,
    runner: Arc<TrainRunner>,
}

impl Dispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(gpu_ids: Vec<u32>, workers_per_gpu: usize, runner: TrainRunner) -> Self {
        Self {
            gpu_ids,
            workers_per_gpu,
            runner: Arc::new(runner),
        }
    }

    /// Size of the worker pool.
    #[must_use]
    pub fn total_workers(&self) -> usize {
        self.gpu_ids.len() * self.workers_per_gpu
    }

    /// GPU id for each worker slot: every listed GPU gets `workers_per_gpu`
    /// consecutive workers.
    #[must_use]
    pub fn assignments(&self) -> Vec<u32> {
        self.gpu_ids
            .iter()
            .flat_map(|&gpu| std::iter::repeat_n(gpu, self.workers_per_gpu))
            .collect()
    }

    /// Run every task to completion and return once all workers have joined.
    ///
    /// The queue is filled before any worker starts: all tasks in order,
    /// then exactly one shutdown sentinel per worker, so each worker drains
    /// one sentinel and terminates. Per-task failures are logged by the
    /// workers and do not affect the join.
    pub async fn run(&self, tasks: Vec<String>) {
        let total_workers = self.total_workers();
        let queue = Arc::new(Mutex::new(enqueue(tasks, total_workers).await));

        let multi = MultiProgress::new();
        let mut handles = Vec::with_capacity(total_workers);
        for (worker_id, gpu_id) in self.assignments().into_iter().enumerate() {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message(format!("worker {worker_id} [gpu {gpu_id}]: idle"));

            handles.push(tokio::spawn(worker::worker_loop(
                worker_id,
                gpu_id,
                queue.clone(),
                self.runner.clone(),
                pb,
            )));
        }

        // Sole synchronization point signalling overall completion
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Build the shared task queue: every task in FIFO order, then one shutdown
/// sentinel per worker.
///
/// The channel is bounded to exactly the number of items enqueued, so the
/// sends never block and the sender can be dropped before workers start.
pub async fn enqueue(tasks: Vec<String>, total_workers: usize) -> mpsc::Receiver<QueueItem> {
    let capacity = (tasks.len() + total_workers).max(1);
    let (tx, rx) = mpsc::channel(capacity);
    for motion in tasks {
        let _ = tx.send(QueueItem::Task(motion)).await;
    }
    for _ in 0..total_workers {
        let _ = tx.send(QueueItem::Shutdown).await;
    }
    rx
}

#[cfg(test)]
mod tests {
    use wbt_config::TrainerParams;

    use super::*;

    fn dispatcher(gpu_ids: Vec<u32>, workers_per_gpu: usize) -> Dispatcher {
        let runner = TrainRunner::new(TrainerParams::default(), "./logs/dispatch");
        Dispatcher::new(gpu_ids, workers_per_gpu, runner)
    }

    #[test]
    fn test_total_workers() {
        assert_eq!(dispatcher(vec![0, 1], 2).total_workers(), 4);
        assert_eq!(dispatcher(vec![3], 1).total_workers(), 1);
        assert_eq!(dispatcher(vec![], 2).total_workers(), 0);
    }

    #[test]
    fn test_assignments_block_per_gpu() {
        assert_eq!(dispatcher(vec![0, 1], 2).assignments(), vec![0, 0, 1, 1]);
        assert_eq!(dispatcher(vec![2, 5], 1).assignments(), vec![2, 5]);
    }

    #[tokio::test]
    async fn test_enqueue_tasks_then_sentinels() {
        let tasks = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut rx = enqueue(tasks, 4).await;

        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }

        assert_eq!(items.len(), 3 + 4);
        assert_eq!(items[0], QueueItem::Task("a".to_string()));
        assert_eq!(items[1], QueueItem::Task("b".to_string()));
        assert_eq!(items[2], QueueItem::Task("c".to_string()));
        let sentinels = items
            .iter()
            .filter(|i| **i == QueueItem::Shutdown)
            .count();
        assert_eq!(sentinels, 4);
    }

    #[tokio::test]
    async fn test_enqueue_empty_task_list_still_stops_workers() {
        let mut rx = enqueue(Vec::new(), 2).await;
        assert_eq!(rx.recv().await, Some(QueueItem::Shutdown));
        assert_eq!(rx.recv().await, Some(QueueItem::Shutdown));
        assert_eq!(rx.recv().await, None);
    }
}

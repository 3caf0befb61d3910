// Parallel checksum pipeline
// A fixed pool of worker threads drains a bounded task queue and publishes results

use super::error::HashUtilityError;
use super::hash::HashComputer;
use crossbeam_channel::{bounded, Receiver, Sender};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Task queue capacity; large enough that the dispatcher rarely waits
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A path waiting for its digest; owned by exactly one worker once received
#[derive(Debug)]
pub struct ChecksumTask {
    pub path: PathBuf,
}

/// One computed digest in display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumResult {
    pub path: PathBuf,
    pub digest: String,
}

impl ChecksumResult {
    pub fn new(path: impl Into<PathBuf>, digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
        }
    }
}

/// Counters shared by the workers
#[derive(Debug, Default)]
struct PipelineStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    bytes_hashed: AtomicU64,
}

impl PipelineStats {
    fn record_success(&self, bytes: u64) {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}

/// Everything the pipeline produced, in arrival order
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub results: Vec<ChecksumResult>,
    /// Tasks finished, successfully or not
    pub completed: usize,
    pub failed: usize,
    pub bytes_hashed: u64,
}

/// Fixed-size pool of checksum workers
///
/// Runs to completion once started: no retries, no timeouts, no cancellation.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    queue_capacity: usize,
    progress: ProgressBar,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(Self::default_workers())
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress: ProgressBar::hidden(),
        }
    }

    /// One worker per logical CPU
    pub fn default_workers() -> usize {
        num_cpus::get().max(1)
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Tick this bar once per finished task
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Checksum every path and collect the results
    ///
    /// A path that fails to hash is logged and left out of the results; it still
    /// counts toward completion. The results channel closes once all workers have
    /// drained the queue, which ends collection.
    pub fn run(
        &self,
        files: Vec<PathBuf>,
        computer: &HashComputer,
    ) -> Result<PipelineOutcome, HashUtilityError> {
        let total = files.len();
        if total == 0 {
            return Ok(PipelineOutcome::default());
        }

        let computer = Arc::new(computer.clone());
        let stats = Arc::new(PipelineStats::default());
        let (task_tx, task_rx) = bounded::<ChecksumTask>(self.queue_capacity);
        let (result_tx, result_rx) = bounded::<ChecksumResult>(self.queue_capacity);

        // never more workers than tasks
        let worker_count = self.workers.min(total);
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let tasks = task_rx.clone();
            let results = result_tx.clone();
            let computer = Arc::clone(&computer);
            let stats = Arc::clone(&stats);
            let progress = self.progress.clone();

            let handle = thread::Builder::new()
                .name(format!("checksum-{}", id))
                .spawn(move || worker_loop(id, tasks, results, &computer, &stats, &progress))
                .map_err(|e| HashUtilityError::WorkerFailed {
                    id,
                    reason: e.to_string(),
                })?;
            handles.push(handle);
        }
        // only the workers hold these from here on
        drop(task_rx);
        drop(result_tx);

        let dispatcher = thread::Builder::new()
            .name("checksum-dispatch".to_string())
            .spawn(move || {
                for path in files {
                    if task_tx.send(ChecksumTask { path }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| HashUtilityError::WorkerFailed {
                id: worker_count,
                reason: format!("dispatcher: {}", e),
            })?;

        let mut results = Vec::with_capacity(total);
        results.extend(result_rx.iter());

        if dispatcher.join().is_err() {
            return Err(HashUtilityError::WorkerFailed {
                id: worker_count,
                reason: "dispatcher panicked".to_string(),
            });
        }
        for (id, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                return Err(HashUtilityError::WorkerFailed {
                    id,
                    reason: "worker panicked".to_string(),
                });
            }
        }

        let completed = stats.completed.load(Ordering::Acquire);
        if completed != total {
            return Err(HashUtilityError::WorkerFailed {
                id: worker_count,
                reason: format!("{} of {} tasks completed", completed, total),
            });
        }
        debug!(completed, workers = worker_count, "checksum pipeline drained");

        Ok(PipelineOutcome {
            results,
            completed,
            failed: stats.failed.load(Ordering::Relaxed),
            bytes_hashed: stats.bytes_hashed.load(Ordering::Relaxed),
        })
    }
}

fn worker_loop(
    id: usize,
    tasks: Receiver<ChecksumTask>,
    results: Sender<ChecksumResult>,
    computer: &HashComputer,
    stats: &PipelineStats,
    progress: &ProgressBar,
) {
    for task in tasks.iter() {
        match computer.compute_digest(&task.path) {
            Ok(hashed) => {
                stats.record_success(hashed.bytes);
                let sent = results.send(ChecksumResult {
                    path: task.path,
                    digest: hashed.encoded,
                });
                if sent.is_err() {
                    debug!(worker = id, "results channel closed early");
                    break;
                }
            }
            Err(e) => {
                stats.record_failure();
                error!(worker = id, path = %task.path.display(), "checksum failed: {}", e);
            }
        }
        progress.inc(1);
    }
}

//! Bounded Worker Pool
//!
//! Runs a closed list of items through a dedicated rayon pool of at most
//! `concurrency` threads. Every item is handed to exactly one worker exactly
//! once, and the call returns only after all workers are done, with results
//! in input order.

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to create worker pool with {workers} threads: {reason}")]
    Build { workers: usize, reason: String },
}

/// Number of worker threads for `items` items: `min(concurrency, items)`,
/// never less than one.
pub fn worker_count(concurrency: usize, items: usize) -> usize {
    concurrency.max(1).min(items.max(1))
}

/// Map `items` through `work` on a pool of `worker_count(concurrency, len)`
/// threads.
///
/// A failing item is the caller's business: `work` returns whatever outcome
/// type it likes, and one item's result never affects another's scheduling.
pub fn run_bounded<T, R, F>(items: Vec<T>, concurrency: usize, work: F) -> Result<Vec<R>, PoolError>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync + Send,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let workers = worker_count(concurrency, items.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("convert-worker-{}", i))
        .build()
        .map_err(|e| PoolError::Build {
            workers,
            reason: e.to_string(),
        })?;

    debug!(workers, items = items.len(), "Worker pool started");

    // install() returns only after every worker has finished: the join barrier
    let results: Vec<R> = pool.install(|| items.into_par_iter().map(work).collect());

    debug!(results = results.len(), "Worker pool drained");

    Ok(results)
}

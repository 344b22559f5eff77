//! Worker Pool Dispatcher
//!
//! Fans planned jobs out to a bounded pool, runs the converter once per ready
//! job, and folds every outcome into a [`BatchResult`]. A failing job only
//! marks its own outcome; the pool always drains the whole plan.

use crate::error::{ConversionError, Result};
use crate::job::{ConversionJob, PlannedJob};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Number of conversions allowed in flight. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(NonZeroUsize);

impl Concurrency {
    /// Clamp any requested value into `1..`.
    pub fn from_requested(requested: i64) -> Self {
        let clamped = usize::try_from(requested).unwrap_or(0).max(1);
        Self(NonZeroUsize::new(clamped).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::from_requested(DEFAULT_CONCURRENCY as i64)
    }
}

pub type ConvertResult = std::result::Result<(), ConversionError>;

/// Converts one job. Implementations block until the conversion is done.
pub trait Converter: Sync {
    fn convert(&self, job: &ConversionJob) -> ConvertResult;
}

impl<F> Converter for F
where
    F: Fn(&ConversionJob) -> ConvertResult + Sync,
{
    fn convert(&self, job: &ConversionJob) -> ConvertResult {
        self(job)
    }
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub job: ConversionJob,
    pub error: Option<ConversionError>,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Every job of one invocation, each accounted for exactly once.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub succeeded: Vec<ConversionJob>,
    pub failed: Vec<(ConversionJob, ConversionError)>,
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ConversionOutcome) {
        match outcome.error {
            None => self.succeeded.push(outcome.job),
            Some(err) => self.failed.push((outcome.job, err)),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when nothing failed. An empty batch counts as success.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            100.0
        } else {
            (self.succeeded.len() as f64 / self.total() as f64) * 100.0
        }
    }
}

impl FromIterator<ConversionOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ConversionOutcome>>(iter: I) -> Self {
        let mut result = BatchResult::new();
        for outcome in iter {
            result.record(outcome);
        }
        result
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    concurrency: Concurrency,
}

impl Dispatcher {
    pub fn new(concurrency: Concurrency) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Run every planned job and return once all workers have joined.
    ///
    /// Only a pool that can't be built is an `Err`, and in that case no job
    /// has started.
    pub fn dispatch<C: Converter>(&self, plan: Vec<PlannedJob>, converter: &C) -> Result<BatchResult> {
        let started = Instant::now();
        let total = plan.len();

        info!(
            jobs = total,
            workers = shared_utils::worker_pool::worker_count(self.concurrency.get(), total),
            "Dispatching conversions"
        );

        let outcomes = shared_utils::run_bounded(plan, self.concurrency.get(), |planned| {
            run_job(planned, converter)
        })?;

        let mut result: BatchResult = outcomes.into_iter().collect();
        result.elapsed = started.elapsed();

        debug_assert_eq!(result.total(), total);
        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            elapsed_secs = result.elapsed.as_secs_f64(),
            "Dispatch complete"
        );

        Ok(result)
    }
}

fn run_job<C: Converter>(planned: PlannedJob, converter: &C) -> ConversionOutcome {
    let job = match planned {
        PlannedJob::Ready(job) => job,
        PlannedJob::Rejected(job, err) => {
            warn!(input = %job.input().display(), error = %err, "Job rejected before running");
            return ConversionOutcome {
                job,
                error: Some(err),
            };
        }
    };

    debug!(input = %job.input().display(), output = %job.output().display(), "Running");

    match converter.convert(&job) {
        Ok(()) => {
            info!(
                input = %job.input().display(),
                output = %job.output().display(),
                "Converted"
            );
            ConversionOutcome { job, error: None }
        }
        Err(err) => {
            warn!(input = %job.input().display(), error = %err, "Conversion failed");
            ConversionOutcome {
                job,
                error: Some(err),
            }
        }
    }
}

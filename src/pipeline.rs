use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::queue::{self, QueueSender};
use crate::reducer::Reducer;
use crate::source::{FsSource, Source};
use crate::tally::{PartialCount, Tally, WordCounts};
use crate::tokenizer::{ChunkBoundary, Tokenizer};
use crate::worker::Worker;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Count words in `files` using the local filesystem
///
/// Per-file failures are logged and skipped; only configuration problems
/// (no files, an empty pool) are returned as errors.
pub fn run<P: AsRef<str>>(
    files: &[P],
    worker_count: usize,
    reducer_count: usize,
) -> Result<WordCounts> {
    let pipeline = PipelineBuilder::new()
        .workers(worker_count)
        .reducers(reducer_count)
        .build()?;
    Ok(pipeline.run(files)?.counts)
}

/// Builder for constructing pipelines
pub struct PipelineBuilder<S = FsSource> {
    config: PipelineConfig,
    source: S,
}

impl PipelineBuilder<FsSource> {
    /// Create a new pipeline builder reading from the filesystem
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            source: FsSource,
        }
    }
}

impl Default for PipelineBuilder<FsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Source> PipelineBuilder<S> {
    /// Replace the whole configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker pool size
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the reducer pool size
    pub fn reducers(mut self, count: usize) -> Self {
        self.config.reducers = count;
        self
    }

    /// Set the number of bytes read per chunk
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Set the chunk boundary mode
    pub fn boundary(mut self, boundary: ChunkBoundary) -> Self {
        self.config.boundary = boundary;
        self
    }

    /// Set the work queue capacity
    pub fn work_queue_size(mut self, capacity: usize) -> Self {
        self.config.work_queue_size = Some(capacity);
        self
    }

    /// Set the result queue capacity
    pub fn result_queue_size(mut self, capacity: usize) -> Self {
        self.config.result_queue_size = Some(capacity);
        self
    }

    /// Read inputs from a different source
    pub fn source<T: Source>(self, source: T) -> PipelineBuilder<T> {
        PipelineBuilder {
            config: self.config,
            source,
        }
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline<S>> {
        self.config.validate()?;
        Ok(Pipeline {
            config: self.config,
            source: Arc::new(self.source),
        })
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final word counts across all files
    pub counts: WordCounts,
    /// Counters collected during the run
    pub metrics: MetricsSnapshot,
}

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Setup,
    StartReducers,
    StartWorkers,
    FeedAndDrain,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::StartReducers => "start-reducers",
            Phase::StartWorkers => "start-workers",
            Phase::FeedAndDrain => "feed-and-drain",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A configured word count pipeline
///
/// Each call to [`Pipeline::run`] builds fresh queues, pools and tally, so
/// one pipeline can be run any number of times.
pub struct Pipeline<S = FsSource> {
    config: PipelineConfig,
    source: Arc<S>,
}

impl<S: Source> Pipeline<S> {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Count words across `files`
    ///
    /// Reducers start first, then workers. Once every file has been queued
    /// the work queue is closed and all workers are joined; only then is the
    /// result queue closed and the reducers joined, so no partial count can
    /// be left behind.
    pub fn run<P: AsRef<str>>(&self, files: &[P]) -> Result<RunOutcome> {
        if files.is_empty() {
            return Err(PipelineError::NoInput);
        }
        let config = &self.config;
        info!(
            files = files.len(),
            workers = config.workers,
            reducers = config.reducers,
            chunk_size = config.chunk_size,
            "Starting word count"
        );

        debug!(phase = %Phase::Setup, "Entering phase");
        let (work_tx, work_rx) = queue::bounded::<String>(config.work_queue_capacity());
        let (result_tx, result_rx) = queue::bounded::<PartialCount>(config.result_queue_capacity());
        let work_stats = work_tx.stats();
        let result_stats = result_tx.stats();
        let tally = Arc::new(Tally::new());
        let metrics = PipelineMetrics::new();
        let tokenizer = Tokenizer::new(config.chunk_size).boundary(config.boundary);

        debug!(phase = %Phase::StartReducers, "Entering phase");
        let mut reducers = Vec::with_capacity(config.reducers);
        for id in 0..config.reducers {
            match Reducer::spawn(id, result_rx.clone(), Arc::clone(&tally), metrics.clone()) {
                Ok(reducer) => reducers.push(reducer),
                Err(e) => return Err(abort(work_tx, result_tx, Vec::new(), reducers, e)),
            }
        }
        drop(result_rx);

        debug!(phase = %Phase::StartWorkers, "Entering phase");
        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let spawned = Worker::spawn(
                id,
                Arc::clone(&self.source),
                tokenizer,
                work_rx.clone(),
                result_tx.clone(),
                metrics.clone(),
            );
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => return Err(abort(work_tx, result_tx, workers, reducers, e)),
            }
        }
        drop(work_rx);

        debug!(phase = %Phase::FeedAndDrain, "Entering phase");
        for path in files {
            if let Err(path) = work_tx.send(path.as_ref().to_string()) {
                error!(path = %path, "Work queue has no workers left, stopping feed");
                break;
            }
        }
        work_tx.close();

        let mut failure = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                error!(error = %e, "Worker did not shut down cleanly");
                failure.get_or_insert(e);
            }
        }

        // Every worker is gone, so this drops the last result sender.
        result_tx.close();
        for reducer in reducers {
            if let Err(e) = reducer.join() {
                error!(error = %e, "Reducer did not shut down cleanly");
                failure.get_or_insert(e);
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let counts = Arc::try_unwrap(tally)
            .map_err(|_| PipelineError::Thread("tally still shared after join".into()))?
            .into_counts();
        let metrics = metrics
            .snapshot()
            .with_queues(work_stats.snapshot(), result_stats.snapshot());
        debug!(phase = %Phase::Done, "Entering phase");

        info!(
            distinct = counts.len(),
            words = metrics.words_counted,
            failed_files = metrics.failed_files(),
            result_queue_blocked = metrics.result_queue.blocked,
            elapsed_ms = metrics.elapsed.as_millis() as u64,
            "Word count finished"
        );

        Ok(RunOutcome { counts, metrics })
    }
}

/// Shut down whatever was started, keeping the two-phase order
fn abort(
    work_tx: QueueSender<String>,
    result_tx: QueueSender<PartialCount>,
    workers: Vec<Worker>,
    reducers: Vec<Reducer>,
    err: PipelineError,
) -> PipelineError {
    error!(error = %err, "Pipeline startup failed, shutting down");
    work_tx.close();
    for worker in workers {
        let _ = worker.join();
    }
    result_tx.close();
    for reducer in reducers {
        let _ = reducer.join();
    }
    err
}

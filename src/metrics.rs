use crate::queue::QueueSnapshot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A simple percentile tracker that maintains a sliding window of measurements
#[derive(Debug, Clone)]
pub struct PercentileTracker {
    measurements: Arc<Mutex<VecDeque<u64>>>,
    window_size: usize,
}

impl PercentileTracker {
    /// Create a new percentile tracker with a specified window size
    pub fn new(window_size: usize) -> Self {
        Self {
            measurements: Arc::new(Mutex::new(VecDeque::with_capacity(window_size))),
            window_size,
        }
    }

    /// Record a measurement (in nanoseconds)
    pub fn record(&self, nanos: u64) {
        let mut measurements = self.measurements.lock();
        if measurements.len() >= self.window_size {
            measurements.pop_front();
        }
        measurements.push_back(nanos);
    }

    pub fn p50_us(&self) -> f64 {
        self.percentile(0.50)
    }

    pub fn p95_us(&self) -> f64 {
        self.percentile(0.95)
    }

    pub fn p99_us(&self) -> f64 {
        self.percentile(0.99)
    }

    fn percentile(&self, p: f64) -> f64 {
        let measurements = self.measurements.lock();
        if measurements.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<_> = measurements.iter().copied().collect();
        sorted.sort_unstable();

        let idx = ((sorted.len() as f64 * p).ceil() as usize).saturating_sub(1);
        sorted[idx] as f64 / 1000.0
    }

    /// Number of measurements currently in the window
    pub fn count(&self) -> usize {
        self.measurements.lock().len()
    }
}

/// Counters collected while a pipeline runs
///
/// Workers and reducers hold clones; every counter is an atomic so
/// recording never contends with the tally lock.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    files_opened: Arc<AtomicU64>,
    open_failures: Arc<AtomicU64>,
    read_failures: Arc<AtomicU64>,
    faults: Arc<AtomicU64>,
    partials_merged: Arc<AtomicU64>,
    words_counted: Arc<AtomicU64>,
    /// Per-file processing time
    file_latency: PercentileTracker,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            files_opened: Arc::new(AtomicU64::new(0)),
            open_failures: Arc::new(AtomicU64::new(0)),
            read_failures: Arc::new(AtomicU64::new(0)),
            faults: Arc::new(AtomicU64::new(0)),
            partials_merged: Arc::new(AtomicU64::new(0)),
            words_counted: Arc::new(AtomicU64::new(0)),
            file_latency: PercentileTracker::new(1000),
            start_time: Instant::now(),
        }
    }

    pub fn record_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one partial count merged into the tally
    pub fn record_merge(&self, words: u64) {
        self.partials_merged.fetch_add(1, Ordering::Relaxed);
        self.words_counted.fetch_add(words, Ordering::Relaxed);
    }

    /// Record how long one file took to tokenize
    ///
    /// Only files that produced a partial count are timed; faulted files are not.
    pub fn record_file_latency(&self, elapsed: Duration) {
        self.file_latency.record(elapsed.as_nanos() as u64);
    }

    pub fn files_opened(&self) -> u64 {
        self.files_opened.load(Ordering::Relaxed)
    }

    pub fn open_failures(&self) -> u64 {
        self.open_failures.load(Ordering::Relaxed)
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }

    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn partials_merged(&self) -> u64 {
        self.partials_merged.load(Ordering::Relaxed)
    }

    pub fn words_counted(&self) -> u64 {
        self.words_counted.load(Ordering::Relaxed)
    }

    /// Words merged per second since the metrics were created
    pub fn throughput_wps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            self.words_counted() as f64 / elapsed
        }
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_opened: self.files_opened(),
            open_failures: self.open_failures(),
            read_failures: self.read_failures(),
            faults: self.faults(),
            partials_merged: self.partials_merged(),
            words_counted: self.words_counted(),
            throughput_wps: self.throughput_wps(),
            file_p50_us: self.file_latency.p50_us(),
            file_p95_us: self.file_latency.p95_us(),
            file_p99_us: self.file_latency.p99_us(),
            elapsed: self.start_time.elapsed(),
            work_queue: QueueSnapshot::default(),
            result_queue: QueueSnapshot::default(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub files_opened: u64,
    pub open_failures: u64,
    pub read_failures: u64,
    pub faults: u64,
    pub partials_merged: u64,
    pub words_counted: u64,
    pub throughput_wps: f64,
    pub file_p50_us: f64,
    pub file_p95_us: f64,
    pub file_p99_us: f64,
    pub elapsed: Duration,
    /// File identifiers fed to workers
    pub work_queue: QueueSnapshot,
    /// Partial counts handed to reducers; `blocked` is worker backpressure
    pub result_queue: QueueSnapshot,
}

impl MetricsSnapshot {
    /// Files that could not be fully read, for whatever reason
    pub fn failed_files(&self) -> u64 {
        self.open_failures + self.read_failures + self.faults
    }

    /// Attach the queue counters of a finished run
    pub fn with_queues(mut self, work: QueueSnapshot, result: QueueSnapshot) -> Self {
        self.work_queue = work;
        self.result_queue = result;
        self
    }

    /// Format metrics as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Files: {} opened, {} unopenable, {} truncated, {} faulted; \
             Partials merged: {}, Words: {}, Throughput: {:.0} words/s, \
             File latency P50: {:.2}µs, P95: {:.2}µs, P99: {:.2}µs, \
             Work queue: {} sent, {} blocked; \
             Result queue: {} sent, {} received, {} blocked; Elapsed: {:.2}s",
            self.files_opened,
            self.open_failures,
            self.read_failures,
            self.faults,
            self.partials_merged,
            self.words_counted,
            self.throughput_wps,
            self.file_p50_us,
            self.file_p95_us,
            self.file_p99_us,
            self.work_queue.sent,
            self.work_queue.blocked,
            self.result_queue.sent,
            self.result_queue.received,
            self.result_queue.blocked,
            self.elapsed.as_secs_f64()
        )
    }
}

//! Concurrent word counting over many files.
//!
//! Files are counted by a two-stage pipeline: a pool of worker threads turns
//! files into per-file word counts, and a pool of reducer threads merges
//! those counts into one shared tally.
//!
//! # Features
//!
//! - Bounded work and result queues built on crossbeam channels
//! - Chunked tokenization (1 MiB reads by default)
//! - Per-file fault isolation: unreadable files are skipped, read errors
//!   truncate only the affected file, panics are caught per file
//! - Per-run metrics: files opened and failed, words merged, file latency
//!   percentiles
//! - Builder pattern for pool sizes, queue sizes and input sources
//!
//! # Architecture
//!
//! ```text
//!  file list ──▶ Work Queue ──▶ Worker 1..N ──▶ Result Queue ──▶ Reducer 1..M
//!                (bounded)      tokenize         (bounded)        merge under
//!                                                                 tally lock
//! ```
//!
//! The orchestrator closes the work queue after feeding every file, joins all
//! workers, and only then closes the result queue and joins the reducers.
//!
//! # Example
//!
//! ```no_run
//! use wordcount_pipeline::PipelineBuilder;
//!
//! let pipeline = PipelineBuilder::new().workers(4).reducers(2).build()?;
//! let outcome = pipeline.run(&["a.txt", "b.txt"])?;
//! println!("{} distinct words", outcome.counts.len());
//! # Ok::<(), wordcount_pipeline::PipelineError>(())
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod reducer;
pub mod report;
pub mod source;
pub mod tally;
pub mod tokenizer;
pub mod worker;

// Re-exports for convenience
pub use config::{CliArgs, PipelineConfig};
pub use error::{ConfigError, FileError, PipelineError, Result};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{run, Pipeline, PipelineBuilder, RunOutcome};
pub use queue::QueueSnapshot;
pub use source::{FsSource, MemorySource, Source};
pub use tally::{PartialCount, Tally, WordCounts};
pub use tokenizer::{ChunkBoundary, Tokenizer, DEFAULT_CHUNK_SIZE};

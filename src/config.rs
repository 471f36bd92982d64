//! Configuration types
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime pipeline configuration with validation

use crate::error::ConfigError;
use crate::tokenizer::{ChunkBoundary, DEFAULT_CHUNK_SIZE};
use clap::Parser;
use std::num::NonZeroUsize;
use std::thread;

/// Number of threads to use when none is given: one per available core
pub fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Count word occurrences across text files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wordcount",
    version,
    about = "Count word occurrences across text files",
    long_about = "Counts how often each word occurs across a set of files.\n\n\
                  Files are tokenized in parallel by a pool of worker threads and the \
                  per-file counts are merged by a pool of reducer threads. Words are \
                  runs of letters, lower-cased; digits and punctuation separate words.",
    after_help = "EXAMPLES:\n    \
        wordcount books/*.txt\n    \
        wordcount -w 8 -r 2 --print corpus/*.txt\n    \
        wordcount --carry-words --chunk-size 65536 big.log"
)]
pub struct CliArgs {
    /// Files to count
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Number of worker (tokenizer) threads
    #[arg(short = 'w', long, default_value_t = default_parallelism(), value_name = "NUM")]
    pub workers: usize,

    /// Number of reducer (merge) threads
    #[arg(short = 'r', long, default_value_t = default_parallelism(), value_name = "NUM")]
    pub reducers: usize,

    /// Bytes read from a file per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_name = "BYTES")]
    pub chunk_size: usize,

    /// Capacity of the work and result queues (defaults to the worker count)
    #[arg(long, value_name = "NUM")]
    pub queue_size: Option<usize>,

    /// Join words that straddle chunk boundaries instead of splitting them
    #[arg(long)]
    pub carry_words: bool,

    /// Print every word with its count
    #[arg(short = 'p', long)]
    pub print: bool,

    /// Verbose output (per-file debug events)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Worker pool size
    pub workers: usize,

    /// Reducer pool size
    pub reducers: usize,

    /// Bytes per read
    pub chunk_size: usize,

    /// Work queue capacity; follows `workers` when unset
    pub work_queue_size: Option<usize>,

    /// Result queue capacity; follows `workers` when unset
    pub result_queue_size: Option<usize>,

    /// Chunk boundary handling
    pub boundary: ChunkBoundary,
}

impl PipelineConfig {
    /// Configuration with explicit pool sizes and defaults for the rest
    pub fn with_pools(workers: usize, reducers: usize) -> Self {
        Self {
            workers,
            reducers,
            ..Self::default()
        }
    }

    /// Build configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let config = Self {
            workers: args.workers,
            reducers: args.reducers,
            chunk_size: args.chunk_size,
            work_queue_size: args.queue_size,
            result_queue_size: args.queue_size,
            boundary: if args.carry_words {
                ChunkBoundary::Carry
            } else {
                ChunkBoundary::Split
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every knob
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.reducers == 0 {
            return Err(ConfigError::ZeroReducers);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.work_queue_size == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity { queue: "Work" });
        }
        if self.result_queue_size == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity { queue: "Result" });
        }
        Ok(())
    }

    pub fn work_queue_capacity(&self) -> usize {
        self.work_queue_size.unwrap_or(self.workers)
    }

    pub fn result_queue_capacity(&self) -> usize {
        self.result_queue_size.unwrap_or(self.workers)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let parallelism = default_parallelism();
        Self {
            workers: parallelism,
            reducers: parallelism,
            chunk_size: DEFAULT_CHUNK_SIZE,
            work_queue_size: None,
            result_queue_size: None,
            boundary: ChunkBoundary::Split,
        }
    }
}

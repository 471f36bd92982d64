use std::io;
use thiserror::Error;

/// Result type for word count pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run
///
/// Only structural problems end up here. Failures tied to a single input
/// file are logged and absorbed by the worker that hit them.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No input files
    #[error("Cannot start pipeline with no input files")]
    NoInput,

    /// Invalid pool or buffer configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Thread spawn or join failure
    #[error("Thread error: {0}")]
    Thread(String),
}

impl PipelineError {
    /// True for errors raised before any work was started
    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::NoInput | PipelineError::Config(_))
    }
}

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Reducer count must be at least 1")]
    ZeroReducers,

    #[error("Chunk size must be at least 1 byte")]
    ZeroChunkSize,

    /// A queue was given no capacity
    #[error("{queue} queue capacity must be at least 1")]
    ZeroQueueCapacity { queue: &'static str },
}

/// Per-file failures
///
/// These never leave the pipeline; workers build them to log a structured
/// event and then move on to the next file.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to open file '{path}': {source}")]
    Open { path: String, source: io::Error },

    #[error("Error reading file '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("Fault while processing '{path}': {message}")]
    Fault { path: String, message: String },
}

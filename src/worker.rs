//! Worker threads: file identifiers in, partial counts out
//!
//! Each worker:
//! - Pulls file identifiers from the work queue
//! - Opens the file through the pipeline's [`Source`]
//! - Tokenizes it into a [`PartialCount`]
//! - Pushes the partial count onto the result queue
//!
//! Failures are scoped to the file that caused them. A file that cannot be
//! opened is skipped, a read error truncates that file's counts, and a panic
//! while processing one file is caught and logged before the worker moves on.

use crate::error::{FileError, PipelineError};
use crate::metrics::PipelineMetrics;
use crate::queue::{QueueReceiver, QueueSender};
use crate::source::Source;
use crate::tally::PartialCount;
use crate::tokenizer::{count_words, Tokenizer};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, warn};

/// What happened to one input file
#[derive(Debug)]
pub enum FileOutcome {
    /// Read to the end
    Counted(PartialCount),
    /// A read failed part way; counts up to the failure are kept
    Truncated(PartialCount, FileError),
    /// Could not be opened; contributes nothing
    Unopened(FileError),
}

/// Open and tokenize a single file
///
/// The file counts as opened in `metrics` as soon as the source hands back a
/// reader, so a file that fails or panics later is still seen as opened.
pub fn process_file<S: Source>(
    source: &S,
    tokenizer: &Tokenizer,
    path: &str,
    metrics: &PipelineMetrics,
) -> FileOutcome {
    let reader = match source.open(path) {
        Ok(reader) => {
            metrics.record_opened();
            reader
        }
        Err(err) => {
            return FileOutcome::Unopened(FileError::Open {
                path: path.to_string(),
                source: err,
            })
        }
    };

    let (counts, read_error) = count_words(tokenizer.stream(reader));
    let partial = PartialCount::new(path, counts);
    match read_error {
        None => FileOutcome::Counted(partial),
        Some(err) => FileOutcome::Truncated(
            partial,
            FileError::Read {
                path: path.to_string(),
                source: err,
            },
        ),
    }
}

/// A worker thread that turns files into partial counts
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn<S: Source>(
        id: usize,
        source: Arc<S>,
        tokenizer: Tokenizer,
        files: QueueReceiver<String>,
        results: QueueSender<PartialCount>,
        metrics: PipelineMetrics,
    ) -> Result<Self, PipelineError> {
        let handle = thread::Builder::new()
            .name(format!("wc-worker-{}", id))
            .spawn(move || worker_loop(id, &*source, tokenizer, files, results, metrics))
            .map_err(|e| PipelineError::Thread(format!("failed to spawn worker {}: {}", id, e)))?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), PipelineError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PipelineError::Thread(format!("worker {} panicked", self.id))),
            None => Ok(()),
        }
    }
}

/// Main worker loop; returns once the work queue is closed and drained
fn worker_loop<S: Source>(
    id: usize,
    source: &S,
    tokenizer: Tokenizer,
    files: QueueReceiver<String>,
    results: QueueSender<PartialCount>,
    metrics: PipelineMetrics,
) {
    debug!(worker = id, source = source.name(), "Worker starting");
    let mut processed = 0u64;

    for path in files.iter() {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            process_file(source, &tokenizer, &path, &metrics)
        }));

        let partial = match outcome {
            Ok(FileOutcome::Counted(partial)) => partial,
            Ok(FileOutcome::Truncated(partial, err)) => {
                metrics.record_read_failure();
                warn!(worker = id, path = %path, error = %err, "Read failed, keeping partial counts");
                partial
            }
            Ok(FileOutcome::Unopened(err)) => {
                metrics.record_open_failure();
                warn!(worker = id, path = %path, error = %err, "Failed to open file");
                continue;
            }
            Err(payload) => {
                metrics.record_fault();
                let err = FileError::Fault {
                    path: path.clone(),
                    message: panic_message(payload.as_ref()),
                };
                error!(worker = id, path = %path, error = %err, "Worker recovered from fault");
                continue;
            }
        };

        metrics.record_file_latency(start.elapsed());
        debug!(
            worker = id,
            path = %path,
            words = partial.total_words(),
            distinct = partial.counts.len(),
            "Processed file"
        );

        if results.send(partial).is_err() {
            error!(worker = id, "Result queue has no reducers left, stopping");
            break;
        }
        processed += 1;
    }

    debug!(worker = id, files = processed, "Worker exiting");
}

/// Best-effort text from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::source::MemorySource;
    use std::io::{self, Cursor, Read};

    /// Source whose readers panic for one path
    struct PanickySource {
        inner: MemorySource,
        bad_path: &'static str,
    }

    struct PanickyReader {
        inner: Cursor<Vec<u8>>,
        explode: bool,
    }

    impl Read for PanickyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.explode {
                panic!("reader exploded");
            }
            self.inner.read(buf)
        }
    }

    impl Source for PanickySource {
        type Reader = PanickyReader;

        fn open(&self, path: &str) -> io::Result<PanickyReader> {
            Ok(PanickyReader {
                inner: self.inner.open(path)?,
                explode: path == self.bad_path,
            })
        }
    }

    fn run_worker<S: Source>(source: S, paths: &[&str]) -> (Vec<PartialCount>, PipelineMetrics) {
        let (file_tx, file_rx) = queue::bounded(paths.len().max(1));
        let (result_tx, result_rx) = queue::bounded(paths.len().max(1));
        let metrics = PipelineMetrics::new();

        let worker = Worker::spawn(
            0,
            Arc::new(source),
            Tokenizer::new(16),
            file_rx,
            result_tx,
            metrics.clone(),
        )
        .unwrap();

        for path in paths {
            file_tx.send(path.to_string()).unwrap();
        }
        file_tx.close();
        worker.join().unwrap();

        (result_rx.iter().collect(), metrics)
    }

    #[test]
    fn test_process_file_counts() {
        let source = MemorySource::new().with_file("a", "apple orange! banana? apple.");
        let metrics = PipelineMetrics::new();
        match process_file(&source, &Tokenizer::default(), "a", &metrics) {
            FileOutcome::Counted(partial) => {
                assert_eq!(partial.path, "a");
                assert_eq!(partial.counts["apple"], 2);
                assert_eq!(partial.counts["orange"], 1);
                assert_eq!(partial.counts["banana"], 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(metrics.files_opened(), 1);
    }

    #[test]
    fn test_process_file_missing() {
        let metrics = PipelineMetrics::new();
        let outcome = process_file(&MemorySource::new(), &Tokenizer::default(), "nope", &metrics);
        assert!(matches!(outcome, FileOutcome::Unopened(FileError::Open { .. })));
        assert_eq!(metrics.files_opened(), 0);
    }

    #[test]
    fn test_worker_skips_unopenable_files() {
        let source = MemorySource::new()
            .with_file("a", "one two")
            .with_file("b", "two three");
        let (partials, metrics) = run_worker(source, &["a", "missing", "b"]);

        assert_eq!(partials.len(), 2);
        assert_eq!(metrics.files_opened(), 2);
        assert_eq!(metrics.open_failures(), 1);
    }

    #[test]
    fn test_worker_emits_empty_partial() {
        let source = MemorySource::new().with_file("empty", "");
        let (partials, _) = run_worker(source, &["empty"]);

        assert_eq!(partials.len(), 1);
        assert!(partials[0].is_empty());
    }

    #[test]
    fn test_worker_survives_panicking_file() {
        let source = PanickySource {
            inner: MemorySource::new()
                .with_file("good", "fine words")
                .with_file("bad", "boom"),
            bad_path: "bad",
        };
        let (partials, metrics) = run_worker(source, &["bad", "good"]);

        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].path, "good");
        assert_eq!(metrics.faults(), 1);
    }

    #[test]
    fn test_file_faulting_mid_read_counts_as_opened() {
        let source = PanickySource {
            inner: MemorySource::new()
                .with_file("good", "fine words")
                .with_file("bad", "boom"),
            bad_path: "bad",
        };
        let (_, metrics) = run_worker(source, &["bad", "good", "missing"]);

        assert_eq!(metrics.files_opened(), 2);
        assert_eq!(metrics.faults(), 1);
        assert_eq!(metrics.open_failures(), 1);
        assert_eq!(metrics.snapshot().failed_files(), 2);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(17u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

use crate::error::PipelineError;
use crate::metrics::PipelineMetrics;
use crate::queue::QueueReceiver;
use crate::tally::{PartialCount, Tally};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// A reducer thread that merges partial counts into the shared tally
pub struct Reducer {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Reducer {
    /// Spawn a new reducer thread
    pub fn spawn(
        id: usize,
        partials: QueueReceiver<PartialCount>,
        tally: Arc<Tally>,
        metrics: PipelineMetrics,
    ) -> Result<Self, PipelineError> {
        let handle = thread::Builder::new()
            .name(format!("wc-reducer-{}", id))
            .spawn(move || reducer_loop(id, partials, &tally, metrics))
            .map_err(|e| PipelineError::Thread(format!("failed to spawn reducer {}: {}", id, e)))?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the reducer to finish
    pub fn join(mut self) -> Result<(), PipelineError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PipelineError::Thread(format!("reducer {} panicked", self.id))),
            None => Ok(()),
        }
    }
}

/// Merge partial counts until the result queue is closed and drained
fn reducer_loop(
    id: usize,
    partials: QueueReceiver<PartialCount>,
    tally: &Tally,
    metrics: PipelineMetrics,
) {
    debug!(reducer = id, "Reducer starting");
    let mut merged = 0u64;

    for partial in partials.iter() {
        let path = partial.path.clone();
        let words = tally.merge(partial);
        metrics.record_merge(words);
        trace!(reducer = id, path = %path, words, "Merged partial count");
        merged += 1;
    }

    debug!(reducer = id, partials = merged, "Reducer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use crate::tally::WordCounts;

    fn partial(path: &str, words: &[(&str, u64)]) -> PartialCount {
        let counts: WordCounts = words.iter().map(|(w, c)| (w.to_string(), *c)).collect();
        PartialCount::new(path, counts)
    }

    #[test]
    fn test_reducers_drain_queue() {
        let (tx, rx) = queue::bounded(2);
        let tally = Arc::new(Tally::new());
        let metrics = PipelineMetrics::new();

        let reducers: Vec<_> = (0..3)
            .map(|id| Reducer::spawn(id, rx.clone(), Arc::clone(&tally), metrics.clone()).unwrap())
            .collect();
        drop(rx);

        for i in 0..50 {
            tx.send(partial(&format!("f{}", i), &[("banana", 2), ("apple", 1)]))
                .unwrap();
        }
        tx.close();
        for reducer in reducers {
            reducer.join().unwrap();
        }

        let counts = Arc::try_unwrap(tally).unwrap().into_counts();
        assert_eq!(counts["banana"], 100);
        assert_eq!(counts["apple"], 50);
        assert_eq!(metrics.partials_merged(), 50);
        assert_eq!(metrics.words_counted(), 150);
    }

    #[test]
    fn test_reducer_exits_on_closed_empty_queue() {
        let (tx, rx) = queue::bounded::<PartialCount>(1);
        let reducer = Reducer::spawn(7, rx, Arc::new(Tally::new()), PipelineMetrics::new()).unwrap();
        tx.close();
        assert!(reducer.join().is_ok());
    }
}

use parking_lot::Mutex;
use std::collections::HashMap;

/// Word to occurrence count
pub type WordCounts = HashMap<String, u64>;

/// Word counts for a single input file
///
/// Built by one worker, then moved through the result queue to exactly
/// one reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCount {
    /// File the counts were read from
    pub path: String,
    /// Counts for that file alone
    pub counts: WordCounts,
}

impl PartialCount {
    pub fn new(path: impl Into<String>, counts: WordCounts) -> Self {
        Self {
            path: path.into(),
            counts,
        }
    }

    /// Total number of words (not distinct words)
    pub fn total_words(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Final word counts shared by all reducers
///
/// Reducers only touch the map through [`Tally::merge`]; the orchestrator
/// takes the map out with [`Tally::into_counts`] once every reducer has
/// been joined.
#[derive(Debug, Default)]
pub struct Tally {
    counts: Mutex<WordCounts>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every count in `partial` under a single lock acquisition
    ///
    /// Returns the number of words merged.
    pub fn merge(&self, partial: PartialCount) -> u64 {
        let mut merged = 0;
        let mut counts = self.counts.lock();
        for (word, count) in partial.counts {
            *counts.entry(word).or_insert(0) += count;
            merged += count;
        }
        merged
    }

    /// Consume the tally and return the final counts
    pub fn into_counts(self) -> WordCounts {
        self.counts.into_inner()
    }
}

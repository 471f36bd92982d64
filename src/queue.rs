use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared by both halves of a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    sent: AtomicU64,
    received: AtomicU64,
    blocked: AtomicU64,
}

impl QueueStats {
    /// Items accepted by the queue
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Items handed to a consumer
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Sends that found the queue full and had to wait
    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    /// Copy the counters out
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            sent: self.sent(),
            received: self.received(),
            blocked: self.blocked(),
        }
    }
}

/// Queue counters at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub sent: u64,
    pub received: u64,
    pub blocked: u64,
}

/// Create a bounded multi-producer, multi-consumer queue
///
/// The queue closes once every [`QueueSender`] has been dropped; receivers
/// then drain whatever is left and see `None`.
pub fn bounded<T: Send>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = channel::bounded(capacity);
    let stats = Arc::new(QueueStats::default());
    (
        QueueSender {
            inner: tx,
            stats: Arc::clone(&stats),
        },
        QueueReceiver { inner: rx, stats },
    )
}

/// Producer half of a bounded queue
#[derive(Debug)]
pub struct QueueSender<T> {
    inner: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T: Send> QueueSender<T> {
    /// Push an item, blocking while the queue is full
    ///
    /// Gives the item back if every receiver is gone.
    pub fn send(&self, item: T) -> Result<(), T> {
        match self.inner.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(item)) => {
                self.stats.blocked.fetch_add(1, Ordering::Relaxed);
                self.inner.send(item).map_err(|e| e.into_inner())?;
            }
            Err(TrySendError::Disconnected(item)) => return Err(item),
        }
        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close this handle; the queue closes when the last one is gone
    pub fn close(self) {
        drop(self);
    }

    /// Counters shared with every other handle of this queue
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Consumer half of a bounded queue
#[derive(Debug)]
pub struct QueueReceiver<T> {
    inner: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T: Send> QueueReceiver<T> {
    /// Wait for the next item
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn recv(&self) -> Option<T> {
        let item = self.inner.recv().ok()?;
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Iterate until the queue is closed and drained
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

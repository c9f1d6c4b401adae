use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink for "records read / bytes decoded" signals emitted by iterators.
pub trait ElementObserver: Send + Sync {
    fn on_element_read(&self, count: u64, byte_len: u64);
}

/// Running element and byte totals.
#[derive(Debug, Default)]
pub struct ReadCounters {
    elements: AtomicU64,
    bytes: AtomicU64,
}

impl ReadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> u64 {
        self.elements.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl ElementObserver for ReadCounters {
    fn on_element_read(&self, count: u64, byte_len: u64) {
        self.elements.fetch_add(count, Ordering::Relaxed);
        self.bytes.fetch_add(byte_len, Ordering::Relaxed);
    }
}

/// The observers registered on a source, shared by every iterator it opens.
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn ElementObserver>>,
}

impl Observers {
    pub fn push(&mut self, observer: Arc<dyn ElementObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_element_read(&self, byte_len: u64) {
        for observer in &self.observers {
            observer.on_element_read(1, byte_len);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.observers.len()).finish()
    }
}

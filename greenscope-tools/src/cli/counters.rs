use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct Counter {
    val: AtomicUsize,
}
impl Counter {
    pub fn load(&self) -> usize {
        self.val.load(Ordering::Acquire)
    }

    pub fn store(&self, val: usize) {
        self.val.store(val, Ordering::Release);
    }

    pub fn fetch_add(&self, inc: usize) -> usize {
        self.val.fetch_add(inc, Ordering::AcqRel)
    }
}
impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.load())
    }
}

/// Progress of a run over `total` named units.
#[derive(Debug)]
pub struct DetailCounter {
    pub total: Counter,
    pub processed: Counter,
    /// Units without a result, e.g. regions with no pixels.
    pub skipped: Counter,
    name: &'static str,
}
impl DetailCounter {
    pub fn new(name: &'static str) -> Self {
        DetailCounter {
            total: Default::default(),
            processed: Default::default(),
            skipped: Default::default(),
            name,
        }
    }
}
impl fmt::Display for DetailCounter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: completed {}", self.name, self.processed.load())?;
        let skipped = self.skipped.load();
        if skipped > 0 {
            write!(f, " (empty {})", skipped)?;
        }
        write!(f, " of {}.", self.total.load())
    }
}

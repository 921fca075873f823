use crate::cli::*;
use std::sync::Arc;
use std::thread::JoinHandle;

const PROGRESS_UPDATE_MILLIS: u64 = 500;

/// Spinner reporting how many of `len` units (e.g. regions)
/// are done. The spinner stops when the tracker is dropped.
pub struct Tracker {
    progress: Arc<Progress<DetailCounter>>,
    handle: Option<JoinHandle<()>>,
}

impl Tracker {
    pub fn new(units: &'static str, len: usize) -> Self {
        let progress = Arc::new(Progress::new(DetailCounter::new(units)));
        progress.value.total.store(len);
        let handle = progress
            .clone()
            .spawn_auto_update_thread(std::time::Duration::from_millis(PROGRESS_UPDATE_MILLIS));
        Tracker {
            progress,
            handle: Some(handle),
        }
    }

    pub fn increment(&self) {
        self.progress.value.processed.fetch_add(1);
    }

    /// Count a unit that produced no result.
    pub fn skip(&self) {
        self.progress.value.skipped.fetch_add(1);
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.progress.finish();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("progress thread panicked");
            }
        }
    }
}

use indicatif::ProgressBar;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::{fmt::Display, time::Duration};

/// A spinner showing a displayable value, typically a
/// counter updated from worker threads.
pub struct Progress<T> {
    pub bar: ProgressBar,
    pub value: T,
    done: AtomicBool,
}

impl<T> Progress<T> {
    pub fn new(value: T) -> Self {
        let bar = {
            use indicatif::*;
            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg}"),
            );
            progress
        };
        Progress {
            bar,
            value,
            done: AtomicBool::new(false),
        }
    }

    pub fn done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn finish(&self) {
        self.done.store(true, Ordering::Release);
    }
}

impl<T: Display> Progress<T> {
    pub fn update_progress(&self) {
        self.bar.set_message(&format!("{}", self.value));
    }

    /// Update the spinner every `timeout` until `finish` is
    /// called from another thread, then clear it.
    pub fn update_until_done(&self, timeout: Duration) {
        while !self.done() {
            self.update_progress();
            std::thread::park_timeout(timeout);
        }
        self.update_progress();
        self.bar.finish_and_clear();
    }
}

impl<T: Send + Sync + Display + 'static> Progress<T> {
    pub fn spawn_auto_update_thread(self: Arc<Self>, timeout: Duration) -> JoinHandle<()> {
        std::thread::spawn(move || self.update_until_done(timeout))
    }
}

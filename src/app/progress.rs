//! Rewritable status line showing the pages downloaded so far.

use std::time::Duration;

use elibrary_core::PageProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner fed by the acquisition loop; hidden when output is not interactive.
pub(crate) struct PageStatusLine {
    bar: ProgressBar,
}

impl PageStatusLine {
    pub(crate) fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

pub(crate) fn status_message(id: u64, pages: usize) -> String {
    format!("Document {id}: {pages} pages downloaded")
}

impl PageProgress for PageStatusLine {
    fn page_fetched(&self, id: u64, pages: usize) {
        self.bar.set_message(status_message(id, pages));
    }

    fn finished(&self, _id: u64, _pages: usize) {
        self.bar.finish_and_clear();
    }
}

impl Drop for PageStatusLine {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

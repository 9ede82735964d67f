//! Progress-callback trait for per-figure extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each figure. The CLI uses it to drive a
//! terminal progress bar.
//!
//! # Example
//!
//! ```rust
//! use drg_figures::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_figure_written(&self, _autonum: &str, filename: &str, bytes: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{filename} ({bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::SkipReason;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each figure.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive on the calling thread, in document
/// order.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after discovery, before any figure is processed.
    ///
    /// # Arguments
    /// * `total_figures` - number of figure nodes found in the document
    fn on_extraction_start(&self, total_figures: usize) {
        let _ = total_figures;
    }

    /// Called when a figure node yields a usable graphic.
    ///
    /// # Arguments
    /// * `index`  - 1-based position of the figure node
    /// * `autonum` - the figure's number, e.g. `"A.1"`
    /// * `format`  - format display name, e.g. `"PNG"`
    fn on_figure_accepted(&self, index: usize, autonum: &str, format: &str) {
        let _ = (index, autonum, format);
    }

    /// Called when a figure node is left out.
    fn on_figure_skipped(&self, reason: &SkipReason) {
        let _ = reason;
    }

    /// Called after a figure has been written into the staging directory.
    fn on_figure_written(&self, autonum: &str, filename: &str, bytes: usize) {
        let _ = (autonum, filename, bytes);
    }

    /// Called once after delivery.
    ///
    /// # Arguments
    /// * `total_figures` - figure nodes found
    /// * `extracted`     - figures delivered
    fn on_extraction_complete(&self, total_figures: usize, extracted: usize) {
        let _ = (total_figures, extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        accepted: AtomicUsize,
        skipped: Mutex<Vec<SkipReason>>,
        written: Mutex<Vec<String>>,
        extracted: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, total_figures: usize) {
            self.total.store(total_figures, Ordering::SeqCst);
        }

        fn on_figure_accepted(&self, _index: usize, _autonum: &str, _format: &str) {
            self.accepted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_figure_skipped(&self, reason: &SkipReason) {
            self.skipped.lock().unwrap().push(reason.clone());
        }

        fn on_figure_written(&self, _autonum: &str, filename: &str, _bytes: usize) {
            self.written.lock().unwrap().push(filename.to_string());
        }

        fn on_extraction_complete(&self, _total_figures: usize, extracted: usize) {
            self.extracted.store(extracted, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_figure_accepted(1, "1", "PNG");
        cb.on_figure_skipped(&SkipReason::MissingAutonum { index: 2 });
        cb.on_figure_written("1", "figure_fig1.png", 70);
        cb.on_extraction_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_extraction_start(3);
        tracker.on_figure_accepted(1, "1", "PNG");
        tracker.on_figure_written("1", "figurefig1.png", 70);
        tracker.on_figure_skipped(&SkipReason::MissingAutonum { index: 2 });
        tracker.on_figure_accepted(3, "A.1", "SVG");
        tracker.on_figure_written("A.1", "figurefigA1.svg", 12);
        tracker.on_extraction_complete(3, 2);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.accepted.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.lock().unwrap().len(), 1);
        assert_eq!(
            *tracker.written.lock().unwrap(),
            vec!["figurefig1.png", "figurefigA1.svg"]
        );
        assert_eq!(tracker.extracted.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10);
        cb.on_figure_accepted(1, "1", "GIF");
    }
}

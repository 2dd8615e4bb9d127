//! Progress-callback trait for report-generation events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as the renderer works through the checklist.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a UI thread, or a log
//! sink without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` because the
//! generation body runs on a blocking worker thread while the caller's
//! task awaits it.

use std::sync::Arc;

/// Called by the report pipeline as it lays out and draws each item.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Within one generation the calls are strictly
/// sequential (there is no parallel item processing), but they arrive on
/// the blocking worker thread, not the caller's.
pub trait ReportProgressCallback: Send + Sync {
    /// Called once before layout starts.
    ///
    /// # Arguments
    /// * `total_items` — number of checklist items the report will contain
    fn on_generation_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called after an item's text and photo grid have been placed.
    ///
    /// # Arguments
    /// * `order`       — the item's 1-based position
    /// * `total_items` — total items in the snapshot
    fn on_item_rendered(&self, order: u32, total_items: usize) {
        let _ = (order, total_items);
    }

    /// Called when a stored photo cannot be decoded or embedded and its
    /// grid cell is skipped.
    ///
    /// # Arguments
    /// * `order`  — owning item's 1-based position
    /// * `slot`   — 0-based photo slot on that item
    /// * `detail` — human-readable failure description
    fn on_photo_skipped(&self, order: u32, slot: usize, detail: &str) {
        let _ = (order, slot, detail);
    }

    /// Called once after the document bytes have been serialized.
    ///
    /// # Arguments
    /// * `pages`     — page count of the produced document
    /// * `byte_len`  — size of the PDF blob
    fn on_generation_complete(&self, pages: usize, byte_len: usize) {
        let _ = (pages, byte_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        items: AtomicUsize,
        skips: AtomicUsize,
        pages: AtomicUsize,
    }

    impl ReportProgressCallback for TrackingCallback {
        fn on_item_rendered(&self, _order: u32, _total_items: usize) {
            self.items.fetch_add(1, Ordering::SeqCst);
        }

        fn on_photo_skipped(&self, _order: u32, _slot: usize, _detail: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, pages: usize, _byte_len: usize) {
            self.pages.store(pages, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(10);
        cb.on_item_rendered(1, 10);
        cb.on_photo_skipped(2, 0, "corrupt");
        cb.on_generation_complete(3, 40_000);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            items: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            pages: AtomicUsize::new(0),
        };

        tracker.on_generation_start(2);
        tracker.on_item_rendered(1, 2);
        tracker.on_photo_skipped(2, 1, "decode failed");
        tracker.on_item_rendered(2, 2);
        tracker.on_generation_complete(2, 1024);

        assert_eq!(tracker.items.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ReportProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_generation_start(5);
        cb.on_item_rendered(1, 5);
    }
}

//! The narrow progress-reporting seam the orchestrator drives (SPEC_FULL
//! §4.8/§9): four callbacks a caller can implement to render progress,
//! each defaulting to a no-op.

/// Callbacks fired by the orchestrator as a run progresses. All methods have
/// default no-op bodies; implementors override only what they care about.
pub trait Observer: Send + Sync {
    /// A worker has claimed `url` and is about to capture it.
    fn on_page_start(&self, _url: &str) {}

    /// `url` was captured and saved; `size` is the written HTML's byte
    /// length, `links_found` the number of page links discovered on it.
    fn on_page_complete(&self, _url: &str, _size: u64, _links_found: usize) {}

    /// A non-HTML resource was saved.
    fn on_asset_save(&self, _url: &str, _size: u64) {}

    /// Processing `url` failed; `error` is the formatted cause.
    fn on_error(&self, _url: &str, _error: &str) {}
}

/// An [`Observer`] that discards every event, for callers that don't need
/// progress reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl Observer for NoOpObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        starts: AtomicUsize,
        completes: AtomicUsize,
    }

    impl Observer for CountingObserver {
        fn on_page_start(&self, _url: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_complete(&self, _url: &str, _size: u64, _links_found: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_accepts_all_events() {
        let observer = NoOpObserver;
        observer.on_page_start("https://e.com");
        observer.on_page_complete("https://e.com", 100, 3);
        observer.on_asset_save("https://e.com/a.png", 10);
        observer.on_error("https://e.com", "boom");
    }

    #[test]
    fn custom_observer_counts_events() {
        let observer = CountingObserver::default();
        observer.on_page_start("https://e.com");
        observer.on_page_complete("https://e.com", 100, 1);
        assert_eq!(observer.starts.load(Ordering::SeqCst), 1);
        assert_eq!(observer.completes.load(Ordering::SeqCst), 1);
    }
}

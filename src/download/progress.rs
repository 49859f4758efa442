//! Progress reporting capability.

/// Receives progress notifications from the engine.
///
/// `set_total` is called once before any `update`; `update` is called
/// exactly once per item, after the item reached its terminal state.
pub trait ProgressSink: Send + Sync {
    /// Announces the number of items in the run.
    fn set_total(&self, total: usize);

    /// Signals that one more item finished (successfully or not).
    fn update(&self);
}

/// Progress sink that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_total(&self, _total: usize) {}

    fn update(&self) {}
}

impl<P: ProgressSink + ?Sized> ProgressSink for std::sync::Arc<P> {
    fn set_total(&self, total: usize) {
        (**self).set_total(total);
    }

    fn update(&self) {
        (**self).update();
    }
}

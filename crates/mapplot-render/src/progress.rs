//! Status and progress reporting out of a running draw.

use crate::error::{RenderError, RenderResult};
use mapplot_core::CancellationToken;

/// Receives status labels and the completed fraction of a draw.
///
/// Called from the rendering thread; implementations forward to whatever
/// owns the display.
pub trait RenderObserver: Send + Sync {
    fn status(&self, label: &str);
    fn progress(&self, fraction: f64);
}

/// Ignores everything.
pub struct NullObserver;

impl RenderObserver for NullObserver {
    fn status(&self, _label: &str) {}
    fn progress(&self, _fraction: f64) {}
}

pub const STATUS_BASE_LAYER: &str = "Building base layer...";
pub const STATUS_PLOTTING: &str = "Plotting...";
pub const STATUS_HEATMAP_ACCUMULATE: &str = "Accumulating heatmap...";
pub const STATUS_HEATMAP_RENDER: &str = "Rendering heatmap...";
pub const STATUS_CLUSTERING: &str = "Clustering...";

/// Points between cancellation polls inside a single item.
pub const CANCEL_STRIDE: usize = 1024;

/// Cumulative point progress across the whole legend.
pub struct Progress<'a> {
    observer: &'a dyn RenderObserver,
    cancel: &'a CancellationToken,
    total: usize,
    done: usize,
}

impl<'a> Progress<'a> {
    pub fn new(observer: &'a dyn RenderObserver, cancel: &'a CancellationToken, total: usize) -> Self {
        observer.progress(0.0);
        Self {
            observer,
            cancel,
            total,
            done: 0,
        }
    }

    pub fn status(&self, label: &str) {
        tracing::debug!("{}", label);
        self.observer.status(label);
    }

    /// Record a finished item of `points` points.
    pub fn advance(&mut self, points: usize) {
        self.done = (self.done + points).min(self.total);
        self.observer.progress(self.fraction());
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }

    pub fn check(&self) -> RenderResult<()> {
        if self.cancel.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Poll cancellation every [`CANCEL_STRIDE`] points.
    pub fn check_every(&self, index: usize) -> RenderResult<()> {
        if index % CANCEL_STRIDE == 0 {
            self.check()
        } else {
            Ok(())
        }
    }

    pub fn finish(&mut self) {
        self.done = self.total;
        self.observer.progress(1.0);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every callback, for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub statuses: Mutex<Vec<String>>,
        pub fractions: Mutex<Vec<f64>>,
    }

    impl RenderObserver for RecordingObserver {
        fn status(&self, label: &str) {
            self.statuses.lock().push(label.to_string());
        }

        fn progress(&self, fraction: f64) {
            self.fractions.lock().push(fraction);
        }
    }

    #[test]
    fn test_fraction_is_cumulative_points() {
        let observer = RecordingObserver::default();
        let cancel = CancellationToken::new();
        let mut progress = Progress::new(&observer, &cancel, 10);
        progress.advance(3);
        progress.advance(7);
        assert_eq!(*observer.fractions.lock(), vec![0.0, 0.3, 1.0]);
    }

    #[test]
    fn test_empty_draw_is_complete() {
        let cancel = CancellationToken::new();
        let progress = Progress::new(&NullObserver, &cancel, 0);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_check_observes_cancel() {
        let cancel = CancellationToken::new();
        let progress = Progress::new(&NullObserver, &cancel, 5000);
        assert!(progress.check_every(1).is_ok());
        cancel.cancel();
        assert!(progress.check_every(1).is_ok());
        assert!(progress.check_every(2048).unwrap_err().is_cancelled());
    }
}

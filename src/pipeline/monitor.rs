//! Progress reporting and cooperative cancellation
//!
//! Every pass checks for cancellation once per row, before the row touches
//! any accumulator, so an aborted pass never leaves a half-applied row behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::Canceled;

/// Sink for fractional progress and source of cancellation requests
pub trait ExecutionMonitor {
    /// Report progress in `0.0..=1.0`
    fn set_progress(&self, fraction: f64, message: &str);

    /// Fail with `Canceled` if the caller asked to abort
    fn check_canceled(&self) -> Result<(), Canceled>;
}

/// Monitor that reports nothing and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl ExecutionMonitor for NoopMonitor {
    fn set_progress(&self, _fraction: f64, _message: &str) {}

    fn check_canceled(&self) -> Result<(), Canceled> {
        Ok(())
    }
}

/// Shared cancellation flag, cloneable across threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    canceled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

impl ExecutionMonitor for CancelFlag {
    fn set_progress(&self, _fraction: f64, _message: &str) {}

    fn check_canceled(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}

/// Maps a child's `0..1` progress onto `[offset, offset + span]` of a parent
pub struct SubProgress<'a> {
    parent: &'a dyn ExecutionMonitor,
    offset: f64,
    span: f64,
}

impl<'a> SubProgress<'a> {
    pub fn new(parent: &'a dyn ExecutionMonitor, offset: f64, span: f64) -> Self {
        Self {
            parent,
            offset,
            span,
        }
    }
}

impl ExecutionMonitor for SubProgress<'_> {
    fn set_progress(&self, fraction: f64, message: &str) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.parent
            .set_progress(self.offset + fraction * self.span, message);
    }

    fn check_canceled(&self) -> Result<(), Canceled> {
        self.parent.check_canceled()
    }
}

/// Progress fraction for a row index; zero-row tables report full progress
pub(crate) fn row_fraction(row_index: usize, row_count: usize) -> f64 {
    if row_count == 0 {
        1.0
    } else {
        row_index as f64 / row_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        values: Mutex<Vec<f64>>,
    }

    impl ExecutionMonitor for Recorder {
        fn set_progress(&self, fraction: f64, _message: &str) {
            self.values.lock().unwrap().push(fraction);
        }

        fn check_canceled(&self) -> Result<(), Canceled> {
            Ok(())
        }
    }

    #[test]
    fn test_sub_progress_maps_into_parent_range() {
        let parent = Recorder::default();
        let sub = SubProgress::new(&parent, 0.5, 0.5);
        sub.set_progress(0.0, "");
        sub.set_progress(0.5, "");
        sub.set_progress(2.0, "");
        assert_eq!(*parent.values.lock().unwrap(), vec![0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(flag.check_canceled().is_ok());
        other.cancel();
        assert_eq!(flag.check_canceled(), Err(Canceled));
    }
}

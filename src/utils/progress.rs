//! Progress bar helpers using indicatif

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::error::Canceled;
use crate::pipeline::monitor::ExecutionMonitor;

/// Resolution of the fractional progress shown by `ProgressMonitor`
const PROGRESS_STEPS: u64 = 1000;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create a progress bar for known-length operations
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("    {msg:<28} [{bar:40.cyan/blue}] {percent:>3}% ({eta})")
    {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

/// Finish a progress bar with a warning message
pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}

/// Execution monitor drawing a terminal progress bar; never cancels
pub struct ProgressMonitor {
    bar: ProgressBar,
}

impl ProgressMonitor {
    pub fn new(message: &str) -> Self {
        Self {
            bar: create_progress_bar(PROGRESS_STEPS, message),
        }
    }

    pub fn finish(&self, message: &str) {
        finish_with_success(&self.bar, message);
    }

    pub fn abandon(&self, message: &str) {
        finish_with_warning(&self.bar, message);
    }
}

impl ExecutionMonitor for ProgressMonitor {
    fn set_progress(&self, fraction: f64, message: &str) {
        let position = (fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f64) as u64;
        // the bar redraws at its own rate, skip redundant updates
        if position != self.bar.position() {
            self.bar.set_position(position);
            self.bar.set_message(message.to_string());
        }
    }

    fn check_canceled(&self) -> Result<(), Canceled> {
        Ok(())
    }
}

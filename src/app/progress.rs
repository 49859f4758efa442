//! Terminal progress bar for download runs.

use std::time::Duration;

use antenati_core::ProgressSink;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str = "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} pages ({eta})";

/// Progress sink drawing an indicatif bar on stderr.
///
/// `ProgressBar` is internally synchronized, so the engine's collector can
/// update it directly.
#[derive(Debug, Clone)]
pub(crate) struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// Creates a visible bar on stderr.
    pub(crate) fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Creates a bar that counts but never draws.
    pub(crate) fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }

    /// Removes the bar from the terminal.
    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

impl ProgressSink for TerminalProgress {
    fn set_total(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn update(&self) {
        self.bar.inc(1);
    }
}

/// Returns `true` when a progress bar should be drawn.
pub(crate) fn should_use_progress_bar(stderr_is_terminal: bool, quiet: bool) -> bool {
    stderr_is_terminal && !quiet
}

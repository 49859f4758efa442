//! End-of-run report printed to stdout.

use std::fmt::Write as _;
use std::path::Path;

use antenati_core::RunSummary;
use indicatif::HumanBytes;

use crate::ProcessExit;

/// Maps a run summary to the process exit outcome.
pub(crate) fn exit_outcome(summary: &RunSummary) -> ProcessExit {
    if summary.is_complete() {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    }
}

/// Renders the summary of a finished run.
///
/// A complete run prints one line with the downloaded size; a partial
/// failure also lists every failed page with its reason.
pub(crate) fn render_summary(summary: &RunSummary, destination: &Path) -> String {
    let mut out = String::new();
    let total = summary.results().len();

    if summary.is_complete() {
        let _ = writeln!(
            out,
            "Downloaded {total} pages ({}) into {}",
            HumanBytes(summary.total_bytes()),
            destination.display()
        );
        return out;
    }

    let failed = summary.failures().len();
    let _ = writeln!(
        out,
        "Downloaded {} of {total} pages ({}) into {}",
        summary.succeeded(),
        HumanBytes(summary.total_bytes()),
        destination.display()
    );
    let _ = writeln!(out, "{failed} pages failed:");
    for (label, reason) in summary.failures() {
        let _ = writeln!(out, "  {label}: {reason}");
    }
    out
}

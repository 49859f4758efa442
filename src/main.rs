//! CLI entry point for the antenati gallery downloader.

use std::process::ExitCode;

mod app;
mod cli;

/// Process exit outcome.
///
/// `0` every page saved, `1` some pages failed, `2` nothing was attempted
/// because a precondition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Partial,
    Fatal,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Fatal => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let outcome = match app::run_antenati().await {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Fatal
        }
    };
    ExitCode::from(outcome.code())
}

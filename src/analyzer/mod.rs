//! External analyzer invocation
//!
//! The analyzer is a separate executable run as `<program> <args...> <audio-path>`.
//! It must exit 0 and print one JSON object on stdout. Anything else is
//! reported as an `AnalysisOutcome::Failure`.

mod outcome;
mod process;

pub use outcome::{AnalysisOutcome, FailureReason};
pub use process::ProcessAnalyzer;

use std::path::Path;

/// Runs signal analysis on one audio file
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze the file at `path`. Never returns before the child process
    /// has exited or been killed.
    async fn invoke(&self, path: &Path) -> AnalysisOutcome;

    /// Analyzer name for logging
    fn name(&self) -> &str;
}

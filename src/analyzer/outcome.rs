use std::fmt;

/// Why an analyzer run produced no usable output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    TimedOut,
    NonZeroExit,
    ProcessSpawnError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::TimedOut => "timed out",
            FailureReason::NonZeroExit => "non-zero exit",
            FailureReason::ProcessSpawnError => "spawn error",
        };
        f.write_str(s)
    }
}

/// Result of one analyzer run
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success {
        /// Captured stdout, untrimmed
        raw_output: String,
        /// Captured stderr; warnings only when the exit status is 0
        stderr: String,
    },
    Failure {
        reason: FailureReason,
        diagnostic: String,
    },
}

impl AnalysisOutcome {
    pub fn failure(reason: FailureReason, diagnostic: impl Into<String>) -> Self {
        AnalysisOutcome::Failure {
            reason,
            diagnostic: diagnostic.into(),
        }
    }
}

//! Run result and termination cause

use serde::Serialize;
use std::fmt;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    /// Exited with status 0
    Exited,
    /// Exited with a non-zero status
    NonZeroExit,
    /// Killed by a signal this run did not send
    Signaled,
    /// Terminated by the deadline guard
    TimedOut,
    /// Terminated because the calling process was interrupted
    Interrupted,
    /// Never started
    StartFailed,
    /// The process group could not be signalled
    KillFailed,
    /// Waiting on the child failed
    WaitFailed,
}

impl TerminationCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationCause::Exited => "exited",
            TerminationCause::NonZeroExit => "non_zero_exit",
            TerminationCause::Signaled => "signaled",
            TerminationCause::TimedOut => "timed_out",
            TerminationCause::Interrupted => "interrupted",
            TerminationCause::StartFailed => "start_failed",
            TerminationCause::KillFailed => "kill_failed",
            TerminationCause::WaitFailed => "wait_failed",
        }
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Started, exited 0, and was neither timed out nor interrupted
    pub succeeded: bool,
    /// Everything the child wrote to stdout
    pub stdout: String,
    /// Everything the child wrote to stderr
    pub stderr: String,
    /// First failure encountered; empty on success
    pub error_detail: String,
    pub cause: TerminationCause,
    /// Exit code, when the child exited on its own
    pub exit_code: Option<i32>,
    /// Signal that ended the child, if any
    pub signal: Option<i32>,
    /// Wall clock time in milliseconds
    pub wall_time_ms: u64,
}

impl ExecutionResult {
    pub(crate) fn start_failed(detail: String, wall_time_ms: u64) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: String::new(),
            error_detail: detail,
            cause: TerminationCause::StartFailed,
            exit_code: None,
            signal: None,
            wall_time_ms,
        }
    }

    /// Check if the deadline guard ended the run
    pub fn timed_out(&self) -> bool {
        self.cause == TerminationCause::TimedOut
    }

    /// Check if an interrupt to the calling process ended the run
    pub fn interrupted(&self) -> bool {
        self.cause == TerminationCause::Interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_failed_result_is_empty() {
        let result = ExecutionResult::start_failed("failed to start `x`: boom".to_string(), 3);
        assert!(!result.succeeded);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
        assert_eq!(result.cause, TerminationCause::StartFailed);
        assert_eq!(result.error_detail, "failed to start `x`: boom");
        assert!(!result.timed_out());
        assert!(!result.interrupted());
    }

    #[test]
    fn cause_display_matches_serde_name() {
        let causes = [
            TerminationCause::Exited,
            TerminationCause::NonZeroExit,
            TerminationCause::Signaled,
            TerminationCause::TimedOut,
            TerminationCause::Interrupted,
            TerminationCause::StartFailed,
            TerminationCause::KillFailed,
            TerminationCause::WaitFailed,
        ];
        for cause in causes {
            let json = serde_json::to_string(&cause).unwrap();
            assert_eq!(json, format!("\"{}\"", cause));
        }
    }

    #[test]
    fn result_serializes_to_json() {
        let result = ExecutionResult {
            succeeded: false,
            stdout: "partial\n".to_string(),
            stderr: String::new(),
            error_detail: "terminated by signal SIGTERM (timed out after 1s)".to_string(),
            cause: TerminationCause::TimedOut,
            exit_code: None,
            signal: Some(15),
            wall_time_ms: 1002,
        };
        assert!(result.timed_out());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["cause"], "timed_out");
        assert_eq!(value["signal"], 15);
        assert_eq!(value["exit_code"], serde_json::Value::Null);
        assert_eq!(value["stdout"], "partial\n");
    }
}

//! procrun: run one external command and collect a structured result
//!
//! The child is started as the leader of its own process group. Both output
//! pipes are drained concurrently (optionally forwarding each line to a
//! callback), an optional deadline terminates the whole group, and an
//! interrupt delivered to the calling process while the run is active
//! terminates the group as well.
//!
//! # Example
//!
//! ```ignore
//! use procrun::ExecutionRequest;
//!
//! let result = ExecutionRequest::new("/bin/sh")
//!     .args(["-c", "echo hello; echo oops >&2"])
//!     .timeout_secs(10)
//!     .on_stdout_line(|line| print!("[out] {}", line))
//!     .run();
//!
//! assert!(result.succeeded);
//! assert_eq!(result.stdout, "hello\n");
//! ```

pub mod execution;

pub use execution::{
    ExecutionRequest, ExecutionResult, Interrupt, InterruptListener, InterruptSubscription,
    LineCallback, RequestConfig, TerminationCause, run,
};
pub use procrun_core::{self as core, Result, RunError, util};

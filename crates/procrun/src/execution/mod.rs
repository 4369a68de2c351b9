//! Execution layer: launching, draining and supervising one child process
//!
//! - **launcher**: builds the `Command` and starts it in a new process group
//! - **group**: per-platform process-group handle and kill primitive
//! - **stream**: line-by-line draining of stdout/stderr, stdin feeding
//! - **interrupt**: process-wide SIGINT listener that runs subscribe to
//! - **runner**: the `run` coordinator and result assembly

pub mod group;
pub mod interrupt;
mod launcher;
pub mod request;
pub mod result;
pub mod runner;
pub mod stream;

pub use interrupt::{Interrupt, InterruptListener, InterruptSubscription};
pub use request::{ExecutionRequest, RequestConfig};
pub use result::{ExecutionResult, TerminationCause};
pub use runner::run;
pub use stream::LineCallback;

//! Run coordinator
//!
//! One run owns its child, both pipes and its deadline. The calling thread
//! blocks on a single event channel fed by the waiter thread and the
//! interrupt subscription; the deadline guard is the timeout on that
//! channel. Drains and the stdin feeder run on scoped threads, so `run`
//! cannot return before every one of them has finished.

use log::{debug, info, warn};
use procrun_core::RunError;
use std::io;
use std::panic;
use std::process::ExitStatus;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use crate::execution::group::{self, ChildPipes, GroupKiller, signal_name};
use crate::execution::interrupt::{Interrupt, InterruptListener};
use crate::execution::launcher;
use crate::execution::request::ExecutionRequest;
use crate::execution::result::{ExecutionResult, TerminationCause};
use crate::execution::stream::{self, StreamKind};

enum RunEvent {
    Exited(io::Result<ExitStatus>),
    Interrupted(Interrupt),
}

/// Termination this run initiated itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forced {
    TimedOut(Duration),
    Interrupted(Interrupt),
}

struct Supervision {
    exit: io::Result<ExitStatus>,
    forced: Option<Forced>,
    kill_error: Option<RunError>,
}

/// Execute one request and block until the child is reaped and both of its
/// output streams are drained.
///
/// Never fails: every failure (start, non-zero exit, signal, timeout,
/// interrupt) is reported through the returned [`ExecutionResult`].
pub fn run(mut request: ExecutionRequest<'_>) -> ExecutionResult {
    let started = Instant::now();
    let on_stdout = request.on_stdout_line.take();
    let on_stderr = request.on_stderr_line.take();

    let (events, inbox) = mpsc::channel();
    let interrupt_events = events.clone();
    let subscription = InterruptListener::global().subscribe(move |interrupt| {
        let _ = interrupt_events.send(RunEvent::Interrupted(interrupt));
    });

    let (child, pipes) = match launcher::launch(&request) {
        Ok(launched) => launched,
        Err(e) => {
            debug!("Run did not start: {}", e);
            return ExecutionResult::start_failed(e.to_string(), elapsed_ms(started));
        }
    };
    let armed_at = Instant::now();
    let killer = child.killer();
    let ChildPipes {
        stdin,
        stdout,
        stderr,
    } = pipes;
    let payload = request.stdin.as_deref();

    thread::scope(|scope| {
        if let (Some(pipe), Some(payload)) = (stdin, payload) {
            scope.spawn(move || stream::feed_stdin(pipe, payload));
        }

        let stdout_drain = stdout.map(|pipe| {
            scope.spawn(move || stream::drain(pipe, StreamKind::Stdout, on_stdout))
        });
        let stderr_drain = stderr.map(|pipe| {
            scope.spawn(move || stream::drain(pipe, StreamKind::Stderr, on_stderr))
        });

        scope.spawn(move || {
            let exit = child.wait();
            let _ = events.send(RunEvent::Exited(exit));
        });

        let supervision = supervise(
            &inbox,
            &killer,
            request.timeout,
            armed_at,
            request.kill_grace,
        );
        drop(subscription);

        let stdout = join_drain(stdout_drain);
        let stderr = join_drain(stderr_drain);
        assemble(supervision, stdout, stderr, elapsed_ms(started))
    })
}

/// Wait for the child's exit while enforcing the deadline and reacting to
/// interrupts. The first of timeout and interrupt decides the cause; a group
/// still alive `grace` after SIGTERM is sent SIGKILL.
fn supervise(
    inbox: &Receiver<RunEvent>,
    killer: &GroupKiller,
    timeout: Option<Duration>,
    armed_at: Instant,
    grace: Duration,
) -> Supervision {
    // a deadline past the end of `Instant` is no deadline at all
    let mut deadline = timeout.and_then(|t| armed_at.checked_add(t));
    let mut forced = None;
    let mut kill_error = None;

    loop {
        let event = match deadline {
            Some(at) => match inbox.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match inbox.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        match event {
            Some(RunEvent::Exited(exit)) => {
                return Supervision {
                    exit,
                    forced,
                    kill_error,
                };
            }
            Some(RunEvent::Interrupted(interrupt)) => {
                if forced.is_some() {
                    debug!("Ignoring {}, group is already being terminated", interrupt);
                    continue;
                }
                info!("Run {}, terminating process group", interrupt);
                forced = Some(Forced::Interrupted(interrupt));
                deadline = terminate(killer, grace, &mut kill_error);
            }
            None if forced.is_none() => {
                let after = timeout.unwrap_or_default();
                info!("Timed out after {:?}, terminating process group", after);
                forced = Some(Forced::TimedOut(after));
                deadline = terminate(killer, grace, &mut kill_error);
            }
            None => {
                warn!(
                    "Process group still alive {:?} after SIGTERM, sending SIGKILL",
                    grace
                );
                if let Err(e) = killer.kill() {
                    warn!("Failed to kill process group: {}", e);
                    kill_error.get_or_insert(e);
                }
                deadline = None;
            }
        }
    }

    Supervision {
        exit: Err(io::Error::other("waiter exited without reporting a status")),
        forced,
        kill_error,
    }
}

/// SIGTERM the group; returns the SIGKILL deadline when that succeeded.
/// A grace too long to represent means SIGKILL is never sent.
fn terminate(
    killer: &GroupKiller,
    grace: Duration,
    kill_error: &mut Option<RunError>,
) -> Option<Instant> {
    match killer.terminate() {
        Ok(()) => Instant::now().checked_add(grace),
        Err(e) => {
            warn!("Failed to terminate process group: {}", e);
            kill_error.get_or_insert(e);
            None
        }
    }
}

fn join_drain(drain: Option<ScopedJoinHandle<'_, String>>) -> String {
    match drain {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload)),
        None => String::new(),
    }
}

fn assemble(
    supervision: Supervision,
    stdout: String,
    stderr: String,
    wall_time_ms: u64,
) -> ExecutionResult {
    let mut result = ExecutionResult {
        succeeded: false,
        stdout,
        stderr,
        error_detail: String::new(),
        cause: TerminationCause::Exited,
        exit_code: None,
        signal: None,
        wall_time_ms,
    };

    let status = match supervision.exit {
        Ok(status) => status,
        Err(e) => {
            result.cause = TerminationCause::WaitFailed;
            result.error_detail = format!("failed to wait on child: {}", e);
            return result;
        }
    };
    result.exit_code = status.code();
    result.signal = group::exit_signal(&status);
    debug!("Child finished with {:?} after {}ms", status, wall_time_ms);

    if let Some(e) = supervision.kill_error {
        result.cause = TerminationCause::KillFailed;
        result.error_detail = format!("failed to terminate process group: {}", e);
        return result;
    }

    match supervision.forced {
        Some(Forced::TimedOut(after)) => {
            result.cause = TerminationCause::TimedOut;
            result.error_detail =
                format!("{} (timed out after {:?})", describe_status(&status), after);
        }
        Some(Forced::Interrupted(interrupt)) => {
            result.cause = TerminationCause::Interrupted;
            result.error_detail = interrupt.to_string();
        }
        None if status.success() => {
            result.succeeded = true;
        }
        None if result.signal.is_some() => {
            result.cause = TerminationCause::Signaled;
            result.error_detail = describe_status(&status);
        }
        None => {
            result.cause = TerminationCause::NonZeroExit;
            result.error_detail = describe_status(&status);
        }
    }

    result
}

fn describe_status(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit status {}", code);
    }
    match group::exit_signal(status) {
        Some(signal) => format!("terminated by signal {}", signal_name(signal)),
        None => status.to_string(),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

//! Run request: what to execute and how to supervise it

use log::warn;
use procrun_core::{Result, RunError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::execution::result::ExecutionResult;
use crate::execution::runner;
use crate::execution::stream::LineCallback;

/// Time a terminated group gets to exit before it is sent SIGKILL
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Input to one run.
///
/// Callbacks may borrow caller state: they run on scoped threads that are
/// joined before [`run`](runner::run) returns.
pub struct ExecutionRequest<'a> {
    /// Program to execute, looked up through `PATH` when it has no `/`
    pub executable: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Working directory; inherited when unset
    pub current_dir: Option<PathBuf>,
    /// `KEY=VALUE` entries applied on top of the inherited environment
    pub env: Vec<String>,
    /// Entire standard input of the child; `/dev/null` when unset
    pub stdin: Option<Vec<u8>>,
    /// Wall-clock limit; `None` runs without a deadline
    pub timeout: Option<Duration>,
    /// Delay between SIGTERM and SIGKILL once the group is being terminated
    pub kill_grace: Duration,
    pub(crate) on_stdout_line: Option<LineCallback<'a>>,
    pub(crate) on_stderr_line: Option<LineCallback<'a>>,
}

impl Default for ExecutionRequest<'_> {
    fn default() -> Self {
        Self {
            executable: String::new(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
            stdin: None,
            timeout: None,
            kill_grace: DEFAULT_KILL_GRACE,
            on_stdout_line: None,
            on_stderr_line: None,
        }
    }
}

impl fmt::Debug for ExecutionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("executable", &self.executable)
            .field("args", &self.args)
            .field("current_dir", &self.current_dir)
            .field("env", &self.env)
            .field("stdin", &self.stdin.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .field("kill_grace", &self.kill_grace)
            .field("on_stdout_line", &self.on_stdout_line.is_some())
            .field("on_stderr_line", &self.on_stderr_line.is_some())
            .finish()
    }
}

impl<'a> ExecutionRequest<'a> {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Add `key=value` to the child environment
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    /// Add a raw `KEY=VALUE` entry to the child environment
    pub fn env_entry(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set the timeout in whole seconds; `0` disables it
    pub fn timeout_secs(self, seconds: u64) -> Self {
        self.timeout(Duration::from_secs(seconds))
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Forward every stdout line (terminator included) as it is read
    pub fn on_stdout_line<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str) + Send + 'a,
    {
        self.on_stdout_line = Some(Box::new(callback));
        self
    }

    /// Forward every stderr line (terminator included) as it is read
    pub fn on_stderr_line<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str) + Send + 'a,
    {
        self.on_stderr_line = Some(Box::new(callback));
        self
    }

    /// Execute the request. See [`runner::run`].
    pub fn run(self) -> ExecutionResult {
        runner::run(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable.is_empty() {
            return Err(RunError::InvalidRequest(
                "executable must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Environment overrides in application order. Malformed entries are
    /// skipped.
    pub(crate) fn env_pairs(&self) -> Vec<(&str, &str)> {
        self.env
            .iter()
            .filter_map(|entry| {
                let pair = parse_env_entry(entry);
                if pair.is_none() {
                    warn!("Skipping malformed environment entry {:?}", entry);
                }
                pair
            })
            .collect()
    }
}

fn parse_env_entry(entry: &str) -> Option<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Some((key, value)),
        _ => None,
    }
}

/// Serializable description of a request, without callbacks.
///
/// ```json
/// { "executable": "ls", "args": ["-l"], "dir": "/etc", "timeout": 5 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub executable: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub env: Vec<String>,
    pub stdin: Option<String>,
    /// Seconds; `0` means no timeout
    pub timeout: u64,
    /// Seconds between SIGTERM and SIGKILL
    pub kill_grace: Option<u64>,
}

impl RequestConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<RequestConfig> for ExecutionRequest<'_> {
    fn from(config: RequestConfig) -> Self {
        let mut request = ExecutionRequest::new(config.executable)
            .args(config.args)
            .timeout_secs(config.timeout);
        request.current_dir = config.dir;
        request.env = config.env;
        request.stdin = config.stdin.map(String::into_bytes);
        if let Some(grace) = config.kill_grace {
            request.kill_grace = Duration::from_secs(grace);
        }
        request
    }
}

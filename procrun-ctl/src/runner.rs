use console::style;
use log::{debug, info};
use procrun::{util, ExecutionRequest, ExecutionResult, RequestConfig, TerminationCause};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_TIMEOUT: i32 = 124;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Configuration for a single run
#[derive(Debug, Default)]
pub struct RunConfig {
    pub program: Option<String>,
    pub args: Vec<String>,
    pub request: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub env: Vec<String>,
    pub timeout: Option<u64>,
    pub grace: Option<u64>,
    pub stdin_file: Option<PathBuf>,
    pub stream: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn Error>> {
    if !procrun_fs::is_file(path) {
        return Err(format!("{} not found: {}", what, path.display()).into());
    }
    Ok(())
}

/// Build the request: start from the JSON request file or the program on
/// the command line, then apply flag overrides
pub fn build_request<'a>(config: &RunConfig) -> Result<ExecutionRequest<'a>, Box<dyn Error>> {
    let mut request = match (&config.request, &config.program) {
        (Some(path), _) => {
            require_file(path, "request file")?;
            debug!("Loading request from {}", path.display());
            ExecutionRequest::from(RequestConfig::from_json(&procrun_fs::read_file(path))?)
        }
        (None, Some(program)) => {
            ExecutionRequest::new(program.clone()).args(config.args.iter().cloned())
        }
        (None, None) => return Err("no program specified".into()),
    };

    if let Some(dir) = &config.dir {
        debug!("Working directory: {}", dir.display());
        request = request.current_dir(dir.clone());
    }

    for entry in &config.env {
        request = request.env_entry(entry.clone());
    }

    if let Some(t) = config.timeout {
        debug!("Overriding timeout: {}s", t);
        request = request.timeout_secs(t);
    }

    if let Some(g) = config.grace {
        debug!("Overriding kill grace: {}s", g);
        request = request.kill_grace(Duration::from_secs(g));
    }

    if let Some(path) = &config.stdin_file {
        require_file(path, "stdin file")?;
        request = request.stdin(procrun_fs::read_bytes(path)?);
    }

    Ok(request)
}

/// Single streamed line, ` {kind} | {line}` without the trailing newline
pub fn stream_line(kind: &str, line: &str) -> String {
    format!(" {} | {}", kind, line.strip_suffix('\n').unwrap_or(line))
}

/// Process exit code for a finished run
pub fn exit_code(result: &ExecutionResult) -> i32 {
    match result.cause {
        TerminationCause::TimedOut => EXIT_TIMEOUT,
        TerminationCause::Interrupted => EXIT_INTERRUPTED,
        TerminationCause::Exited | TerminationCause::NonZeroExit => {
            result.exit_code.unwrap_or(EXIT_FAILURE)
        }
        _ => EXIT_FAILURE,
    }
}

pub fn summary(result: &ExecutionResult) -> String {
    let succeeded = if result.succeeded {
        style("true").green().bold()
    } else {
        style("false").red().bold()
    };

    let mut line = format!(
        "{}={} | {}={} | {}={}",
        style("succeeded").dim(),
        succeeded,
        style("cause").dim(),
        style(result.cause).bold(),
        style("wall_time_ms").dim(),
        style(result.wall_time_ms).bold(),
    );

    if let Some(code) = result.exit_code {
        line.push_str(&format!(" | {}={}", style("exit_code").dim(), style(code).bold()));
    }

    if !result.error_detail.is_empty() {
        line.push_str(&format!(
            " | {}={}",
            style("error").red(),
            style(&result.error_detail).red()
        ));
    }

    line
}

fn print_captured(kind: &str, text: &str) {
    let text = text.strip_suffix('\n').unwrap_or(text);
    if text.is_empty() {
        return;
    }
    let block = util::pipe_str(kind, "|", text);
    if kind == "stderr" {
        eprintln!("{}", block);
    } else {
        println!("{}", block);
    }
}

pub fn run_command(config: RunConfig) -> Result<i32, Box<dyn Error>> {
    let mut request = build_request(&config)?;

    if config.stream {
        request = request
            .on_stdout_line(|line| println!("{}", stream_line("stdout", line)))
            .on_stderr_line(|line| eprintln!("{}", stream_line("stderr", line)));
    }

    info!("Executing: {} {:?}", request.executable, request.args);
    let result = request.run();
    info!("Run finished in {}ms ({})", result.wall_time_ms, result.cause);

    if let Some(path) = &config.output {
        procrun_fs::write_file(path, &result.stdout)?;
        debug!("Wrote {} bytes of stdout to {}", result.stdout.len(), path.display());
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(exit_code(&result));
    }

    if !config.stream {
        print_captured("stdout", &result.stdout);
        print_captured("stderr", &result.stderr);
    }

    println!("{}", summary(&result));
    Ok(exit_code(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn result(cause: TerminationCause, exit_code: Option<i32>) -> ExecutionResult {
        ExecutionResult {
            succeeded: cause == TerminationCause::Exited,
            stdout: String::new(),
            stderr: String::new(),
            error_detail: String::new(),
            cause,
            exit_code,
            signal: None,
            wall_time_ms: 42,
        }
    }

    #[test]
    fn exit_code_follows_cause() {
        assert_eq!(exit_code(&result(TerminationCause::Exited, Some(0))), 0);
        assert_eq!(exit_code(&result(TerminationCause::NonZeroExit, Some(3))), 3);
        assert_eq!(exit_code(&result(TerminationCause::TimedOut, None)), EXIT_TIMEOUT);
        assert_eq!(
            exit_code(&result(TerminationCause::Interrupted, None)),
            EXIT_INTERRUPTED
        );
        assert_eq!(exit_code(&result(TerminationCause::StartFailed, None)), EXIT_FAILURE);
        assert_eq!(exit_code(&result(TerminationCause::Signaled, None)), EXIT_FAILURE);
    }

    #[test]
    fn summary_lists_outcome_fields() {
        let mut failed = result(TerminationCause::NonZeroExit, Some(2));
        failed.error_detail = "exit status 2".to_string();
        let text = console::strip_ansi_codes(&summary(&failed)).to_string();

        assert_eq!(
            text,
            "succeeded=false | cause=non_zero_exit | wall_time_ms=42 | exit_code=2 | error=exit status 2"
        );
    }

    #[test]
    fn stream_line_drops_trailing_newline() {
        assert_eq!(stream_line("stdout", "hello\n"), " stdout | hello");
        assert_eq!(stream_line("stderr", "partial"), " stderr | partial");
    }

    #[test]
    fn build_request_from_program_and_flags() {
        let config = RunConfig {
            program: Some("echo".to_string()),
            args: vec!["hi".to_string()],
            dir: Some(PathBuf::from("/tmp")),
            env: vec!["A=1".to_string()],
            timeout: Some(3),
            grace: Some(1),
            ..Default::default()
        };
        let request = build_request(&config).unwrap();

        assert_eq!(request.executable, "echo");
        assert_eq!(request.args, vec!["hi"]);
        assert_eq!(request.current_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(request.env, vec!["A=1"]);
        assert_eq!(request.timeout, Some(Duration::from_secs(3)));
        assert_eq!(request.kill_grace, Duration::from_secs(1));
        assert!(request.stdin.is_none());
    }

    #[test]
    fn build_request_from_file_applies_overrides() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("job.json");
        fs::write(&path, r#"{"executable": "cat", "timeout": 10, "stdin": "from-file"}"#).unwrap();

        let config = RunConfig {
            request: Some(path),
            timeout: Some(2),
            ..Default::default()
        };
        let request = build_request(&config).unwrap();

        assert_eq!(request.executable, "cat");
        assert_eq!(request.timeout, Some(Duration::from_secs(2)));
        assert_eq!(request.stdin.as_deref(), Some(b"from-file".as_slice()));
    }

    #[test]
    fn stdin_file_is_loaded() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("input.txt");
        fs::write(&path, "payload").unwrap();

        let config = RunConfig {
            program: Some("cat".to_string()),
            stdin_file: Some(path),
            ..Default::default()
        };
        let request = build_request(&config).unwrap();
        assert_eq!(request.stdin.as_deref(), Some(b"payload".as_slice()));
    }

    #[test]
    fn stdin_file_bytes_pass_through_unchanged() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("input.bin");
        fs::write(&path, b"\xff\x00\xfe").unwrap();

        let config = RunConfig {
            program: Some("cat".to_string()),
            stdin_file: Some(path),
            ..Default::default()
        };
        let request = build_request(&config).unwrap();
        assert_eq!(request.stdin.as_deref(), Some(b"\xff\x00\xfe".as_slice()));
    }

    #[test]
    fn missing_files_are_errors() {
        let tmp = tempdir().unwrap();
        let config = RunConfig {
            request: Some(tmp.path().join("missing.json")),
            ..Default::default()
        };
        let err = build_request(&config).unwrap_err();
        assert!(err.to_string().starts_with("request file not found"));

        let config = RunConfig {
            program: Some("cat".to_string()),
            stdin_file: Some(tmp.path().join("missing.txt")),
            ..Default::default()
        };
        assert!(build_request(&config).is_err());
    }

    #[test]
    fn malformed_request_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("job.json");
        fs::write(&path, "{ not json").unwrap();

        let config = RunConfig {
            request: Some(path),
            ..Default::default()
        };
        assert!(build_request(&config).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn run_command_writes_output_file() {
        let tmp = tempdir().unwrap();
        let output = tmp.path().join("out.txt");
        let config = RunConfig {
            program: Some("echo".to_string()),
            args: vec!["saved".to_string()],
            output: Some(output.clone()),
            ..Default::default()
        };

        assert_eq!(run_command(config).unwrap(), 0);
        assert_eq!(fs::read_to_string(output).unwrap(), "saved\n");
    }

    #[cfg(unix)]
    #[test]
    fn run_command_reports_child_exit_code() {
        let config = RunConfig {
            program: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "exit 7".to_string()],
            json: true,
            ..Default::default()
        };
        assert_eq!(run_command(config).unwrap(), 7);
    }
}

//! Launcher: turn a request into a running group leader

use log::debug;
use procrun_core::{Result, RunError};
use std::process::{Command, Stdio};

use crate::execution::group::{ChildPipes, GroupChild};
use crate::execution::request::ExecutionRequest;

/// Build the child command: arguments, directory, environment overrides
/// and piped output. Stdin is piped only when a payload is present.
pub(crate) fn build_command(request: &ExecutionRequest<'_>) -> Command {
    let mut command = Command::new(&request.executable);
    command.args(&request.args);

    if let Some(dir) = &request.current_dir {
        command.current_dir(dir);
    }

    for (key, value) in request.env_pairs() {
        command.env(key, value);
    }

    command
        .stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    command
}

pub(crate) fn launch(request: &ExecutionRequest<'_>) -> Result<(GroupChild, ChildPipes)> {
    request.validate()?;

    let mut command = build_command(request);
    let (child, pipes) = GroupChild::spawn(&mut command).map_err(|source| RunError::Spawn {
        program: request.executable.clone(),
        source,
    })?;

    debug!(
        "Spawned `{}` {:?} as pid {}",
        request.executable,
        request.args,
        child.id()
    );
    Ok((child, pipes))
}

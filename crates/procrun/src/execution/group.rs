//! Process-group handle and kill primitive
//!
//! On unix the child becomes the leader of a new process group, so the
//! termination signal reaches every descendant that stays in the group.
//! Elsewhere only the tracked child itself can be killed.

use std::process::{ChildStderr, ChildStdin, ChildStdout};

pub use imp::{GroupChild, GroupKiller, exit_signal, signal_name};

/// Pipes taken from a freshly spawned child
#[derive(Debug, Default)]
pub struct ChildPipes {
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
}

fn take_pipes(child: &mut std::process::Child) -> ChildPipes {
    ChildPipes {
        stdin: child.stdin.take(),
        stdout: child.stdout.take(),
        stderr: child.stderr.take(),
    }
}

#[cfg(unix)]
mod imp {
    use super::{ChildPipes, take_pipes};
    use log::debug;
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;
    use procrun_core::{Result, RunError};
    use std::io;
    use std::os::unix::process::{CommandExt, ExitStatusExt};
    use std::process::{Child, Command, ExitStatus};
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Child started as the leader of its own process group
    #[derive(Debug)]
    pub struct GroupChild {
        child: Child,
        killer: GroupKiller,
    }

    impl GroupChild {
        pub fn spawn(command: &mut Command) -> io::Result<(Self, ChildPipes)> {
            command.process_group(0);
            let mut child = command.spawn()?;
            let pipes = take_pipes(&mut child);
            let killer = GroupKiller {
                pgid: Pid::from_raw(child.id() as i32),
                reaped: Arc::new(Mutex::new(false)),
            };
            Ok((Self { child, killer }, pipes))
        }

        pub fn id(&self) -> u32 {
            self.child.id()
        }

        pub fn killer(&self) -> GroupKiller {
            self.killer.clone()
        }

        /// Block until the child exits and reap it.
        ///
        /// Once this returns the killer stops signalling the group. Where the
        /// exit can be observed without reaping, the flag is set before the
        /// pid is released.
        pub fn wait(mut self) -> io::Result<ExitStatus> {
            if wait_exited(self.child.id()) {
                // still a zombie, so the reap below cannot block
                let mut reaped = self.killer.lock_reaped();
                *reaped = true;
                return self.child.wait();
            }

            let status = self.child.wait();
            *self.killer.lock_reaped() = true;
            status
        }
    }

    /// Signals the whole group of a [`GroupChild`]
    #[derive(Debug, Clone)]
    pub struct GroupKiller {
        pgid: Pid,
        reaped: Arc<Mutex<bool>>,
    }

    impl GroupKiller {
        /// Send SIGTERM to every process in the group
        pub fn terminate(&self) -> Result<()> {
            self.signal(Signal::SIGTERM)
        }

        /// Send SIGKILL to every process in the group
        pub fn kill(&self) -> Result<()> {
            self.signal(Signal::SIGKILL)
        }

        fn signal(&self, signal: Signal) -> Result<()> {
            // held across killpg so the flag cannot flip mid-signal
            let reaped = self.lock_reaped();
            if *reaped {
                debug!("Group {} already reaped, not sending {}", self.pgid, signal);
                return Ok(());
            }

            match killpg(self.pgid, signal) {
                Ok(()) => {
                    debug!("Sent {} to process group {}", signal, self.pgid);
                    Ok(())
                }
                Err(Errno::ESRCH) => {
                    debug!("Process group {} is already gone", self.pgid);
                    Ok(())
                }
                Err(e) => Err(RunError::Syscall(format!(
                    "killpg({}, {}) failed: {}",
                    self.pgid, signal, e
                ))),
            }
        }

        fn lock_reaped(&self) -> MutexGuard<'_, bool> {
            self.reaped
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
        }
    }

    /// Block until `pid` has exited, leaving it unreaped
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub(super) fn wait_exited(pid: u32) -> bool {
        use nix::sys::wait::{waitid, Id, WaitPidFlag};

        let pid = Pid::from_raw(pid as i32);
        loop {
            match waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
                Ok(_) => return true,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    debug!("waitid({}) failed, reaping directly: {}", pid, e);
                    return false;
                }
            }
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    pub(super) fn wait_exited(_pid: u32) -> bool {
        false
    }

    /// Signal number that ended the child, if any
    pub fn exit_signal(status: &ExitStatus) -> Option<i32> {
        status.signal()
    }

    pub fn signal_name(signal: i32) -> String {
        Signal::try_from(signal)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|_| format!("signal {}", signal))
    }
}

#[cfg(not(unix))]
mod imp {
    use super::{ChildPipes, take_pipes};
    use log::debug;
    use procrun_core::{Result, RunError};
    use std::io;
    use std::process::{Child, Command, ExitStatus};
    use std::sync::{Arc, Mutex, MutexGuard};
    use std::thread;
    use std::time::Duration;

    const POLL_INTERVAL: Duration = Duration::from_millis(20);

    /// Tracked child. Without process groups only this process is killed.
    #[derive(Debug)]
    pub struct GroupChild {
        id: u32,
        killer: GroupKiller,
    }

    impl GroupChild {
        pub fn spawn(command: &mut Command) -> io::Result<(Self, ChildPipes)> {
            let mut child = command.spawn()?;
            let pipes = take_pipes(&mut child);
            let id = child.id();
            let killer = GroupKiller {
                shared: Arc::new(Mutex::new(Tracked {
                    child,
                    reaped: false,
                })),
            };
            Ok((Self { id, killer }, pipes))
        }

        pub fn id(&self) -> u32 {
            self.id
        }

        pub fn killer(&self) -> GroupKiller {
            self.killer.clone()
        }

        pub fn wait(self) -> io::Result<ExitStatus> {
            loop {
                {
                    let mut tracked = self.killer.lock();
                    match tracked.child.try_wait() {
                        Ok(Some(status)) => {
                            tracked.reaped = true;
                            return Ok(status);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracked.reaped = true;
                            return Err(e);
                        }
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    #[derive(Debug)]
    struct Tracked {
        child: Child,
        reaped: bool,
    }

    #[derive(Debug, Clone)]
    pub struct GroupKiller {
        shared: Arc<Mutex<Tracked>>,
    }

    impl GroupKiller {
        pub fn terminate(&self) -> Result<()> {
            self.kill()
        }

        pub fn kill(&self) -> Result<()> {
            let mut tracked = self.lock();
            if tracked.reaped {
                return Ok(());
            }
            match tracked.child.kill() {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                    debug!("Child {} already exited", tracked.child.id());
                    Ok(())
                }
                Err(e) => Err(RunError::Syscall(format!("kill failed: {}", e))),
            }
        }

        fn lock(&self) -> MutexGuard<'_, Tracked> {
            self.shared
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
        }
    }

    pub fn exit_signal(_status: &ExitStatus) -> Option<i32> {
        None
    }

    pub fn signal_name(signal: i32) -> String {
        format!("signal {}", signal)
    }
}

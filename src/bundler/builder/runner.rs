//! Blocking command execution for probes that must answer before planning continues.

use crate::bundler::error::{Error, Result};
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Runs a shell command and captures its standard output.
///
/// Planning only ever needs this for the signing host probe; the plan's own
/// commands are handed to an external executor.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` through a shell and returns its stdout.
    fn capture(&self, command: &str) -> Result<String>;
}

/// Runs commands with `/bin/sh -c`, killing them after `timeout`.
#[derive(Clone, Debug)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for ShellRunner {
    fn capture(&self, command: &str) -> Result<String> {
        log::debug!("Executing probe: {}", command);

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| Error::CommandFailed {
                command: command.to_string(),
                error,
            })?;

        // Drain both pipes while the child runs so a chatty probe cannot
        // fill a pipe buffer and stall until the timeout.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                // Reap the child so it does not linger as a zombie.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::CommandTimeout {
                    command: command.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(error) => {
                return Err(Error::CommandFailed {
                    command: command.to_string(),
                    error,
                });
            }
        };

        let stdout = collect(stdout)?;
        if !status.success() {
            let stderr = collect(stderr)?;
            return Err(Error::CommandStatus {
                command: command.to_string(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut buf = String::new();
        pipe.read_to_string(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<String>>>) -> Result<String> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(output) => Ok(output?),
            Err(_) => Err(Error::GenericError("pipe reader panicked".into())),
        },
        None => Ok(String::new()),
    }
}

/// Runs `command` up to `attempts` times, returning the first success or the last error.
pub fn capture_with_retries(
    runner: &dyn CommandRunner,
    command: &str,
    attempts: u32,
) -> Result<String> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match runner.capture(command) {
            Ok(output) => return Ok(output),
            Err(e) => {
                log::debug!("Attempt {}/{} of `{}` failed: {}", attempt, attempts, command, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::GenericError(format!("`{command}` never ran"))))
}

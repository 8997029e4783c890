//! Subprocess execution with explicit timeouts
//!
//! Every external command (generators, package managers, git, formatters) goes
//! through the [`Toolchain`] trait so the scaffold pipeline and the
//! prerequisite resolver can be exercised against a scripted environment.

use crate::error::ProcessError;
use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{ChildStderr, ChildStdout, Command as TokioCommand};
use tokio::time::timeout;

/// How long to keep reading output once the child has exited
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A command line to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
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
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Access to external executables
#[allow(async_fn_in_trait)]
pub trait Toolchain {
    /// Resolve `program` on PATH
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion, failing on non-zero exit or when `limit` elapses
    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<(), ProcessError>;

    /// Run and return stdout
    async fn capture(&self, invocation: &Invocation, limit: Duration)
        -> Result<String, ProcessError>;

    fn is_available(&self, program: &str) -> bool {
        self.locate(program).is_some()
    }
}

/// The real PATH, with tokio subprocesses
#[derive(Debug, Clone, Default)]
pub struct SystemToolchain {
    echo: bool,
}

impl SystemToolchain {
    /// `echo` streams child output to the terminal as it arrives
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }

    fn command(&self, invocation: &Invocation) -> Result<TokioCommand, ProcessError> {
        let program = self
            .locate(invocation.program())
            .ok_or_else(|| ProcessError::NotFound {
                program: invocation.program().to_string(),
            })?;
        let mut command = TokioCommand::new(program);
        command.args(invocation.arguments()).kill_on_drop(true);
        if let Some(dir) = invocation.cwd() {
            command.current_dir(dir);
        }
        Ok(command)
    }

    fn echo_line(&self, line: &str, is_stderr: bool) {
        if !self.echo {
            tracing::debug!(target: "devbuddy::process", "{}", line);
        } else if is_stderr {
            eprintln!("  {}", line.yellow());
        } else {
            println!("  {}", line.dimmed());
        }
    }
}

/// Line readers over a child's stdout and stderr
struct OutputPump {
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Lines<BufReader<ChildStderr>>,
    stdout_open: bool,
    stderr_open: bool,
}

impl OutputPump {
    fn new(stdout: ChildStdout, stderr: ChildStderr) -> Self {
        Self {
            stdout: BufReader::new(stdout).lines(),
            stderr: BufReader::new(stderr).lines(),
            stdout_open: true,
            stderr_open: true,
        }
    }

    fn is_open(&self) -> bool {
        self.stdout_open || self.stderr_open
    }

    /// Forward one line from either pipe; false once both are closed
    async fn step(&mut self, toolchain: &SystemToolchain) -> bool {
        tokio::select! {
            line = self.stdout.next_line(), if self.stdout_open => match line {
                Ok(Some(line)) => toolchain.echo_line(&line, false),
                _ => self.stdout_open = false,
            },
            line = self.stderr.next_line(), if self.stderr_open => match line {
                Ok(Some(line)) => toolchain.echo_line(&line, true),
                _ => self.stderr_open = false,
            },
            else => {}
        }
        self.is_open()
    }
}

impl Toolchain for SystemToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, invocation: &Invocation, limit: Duration) -> Result<(), ProcessError> {
        tracing::debug!(command = %invocation, timeout_secs = limit.as_secs(), "running");

        let mut child = self
            .command(invocation)?
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program().to_string(),
                source,
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(ProcessError::Spawn {
                program: invocation.program().to_string(),
                source: std::io::Error::other("child stdio was not captured"),
            });
        };
        let mut output = OutputPump::new(stdout, stderr);

        // The child may leave a background process holding the pipes open,
        // so its exit, not EOF, ends the run
        let finished = timeout(limit, async {
            loop {
                tokio::select! {
                    status = child.wait() => break status,
                    _ = output.step(self), if output.is_open() => {}
                }
            }
        })
        .await;

        let status = match finished {
            Ok(status) => status,
            Err(_) => {
                let _ = child.kill().await;
                return Err(ProcessError::TimedOut {
                    command: invocation.to_string(),
                    secs: limit.as_secs(),
                });
            }
        };

        // Flush whatever the child wrote just before exiting
        let _ = timeout(DRAIN_GRACE, async { while output.step(self).await {} }).await;

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(ProcessError::Failed {
                command: invocation.to_string(),
                code: status.code(),
            }),
            Err(source) => Err(ProcessError::Spawn {
                program: invocation.program().to_string(),
                source,
            }),
        }
    }

    async fn capture(
        &self,
        invocation: &Invocation,
        limit: Duration,
    ) -> Result<String, ProcessError> {
        tracing::debug!(command = %invocation, "capturing");

        let output = self
            .command(invocation)?
            .stdin(Stdio::null())
            .output();

        // kill_on_drop reaps the child if the timeout drops the future
        match timeout(limit, output).await {
            Ok(Ok(output)) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => Err(ProcessError::Failed {
                command: invocation.to_string(),
                code: output.status.code(),
            }),
            Ok(Err(source)) => Err(ProcessError::Spawn {
                program: invocation.program().to_string(),
                source,
            }),
            Err(_) => Err(ProcessError::TimedOut {
                command: invocation.to_string(),
                secs: limit.as_secs(),
            }),
        }
    }
}

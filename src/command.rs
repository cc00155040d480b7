//! Execution of the external handlers configured for a dock.
use std::{
    fmt,
    process::{Command, ExitStatus, Stdio},
};

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::CommandError;

/// An executable plus the arguments it is launched with.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HandlerCommand {
    /// Path (or `PATH`-resolvable name) of the program to run.
    pub cmd: String,
    /// Arguments passed verbatim, in order.
    #[serde(default)]
    pub args: Vec<String>,
}

impl HandlerCommand {
    /// Convenience constructor.
    pub fn new<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for HandlerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cmd)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Something able to execute a [`HandlerCommand`] to completion.
pub trait CommandRunner {
    /// Runs the command and blocks until it finishes.
    fn run(&mut self, command: &HandlerCommand) -> Result<(), CommandError>;
}

/// Runs handlers as child processes of dockhook.
///
/// Stderr is always inherited. Stdout is only inherited when `forward_stdout`
/// is set, which follows the debug setting; otherwise it is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    forward_stdout: bool,
}

impl ProcessRunner {
    /// Creates a runner, optionally passing the child's stdout through.
    pub fn new(forward_stdout: bool) -> Self {
        Self { forward_stdout }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &HandlerCommand) -> Result<(), CommandError> {
        debug!("Executing '{}'", command);

        let stdout = if self.forward_stdout {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let status = Command::new(&command.cmd)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| CommandError::Spawn {
                program: command.cmd.clone(),
                source,
            })?;

        if status.success() {
            info!("'{}' completed successfully", command.cmd);
            Ok(())
        } else {
            Err(CommandError::Exit {
                program: command.cmd.clone(),
                status: describe_status(status),
            })
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exited with status {code}");
    }

    #[cfg(unix)]
    if let Some(signal) = status.signal() {
        return format!("was terminated by signal {signal}");
    }

    "exited unsuccessfully".to_string()
}

use crate::command::ProcessInput;
use crate::error::{Error, Result};
use crate::options::{OutputStream, SpawnOptions, StdioMode};
use crate::output_reader::spawn_drain;
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::process::ExitStatus;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tracing::{debug, warn};

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited normally with this status code.
    Code(i32),
    /// Killed by this signal (Unix).
    Signal(i32),
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }
        Self::Code(status.code().unwrap_or(-1))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "signal {signal}"),
        }
    }
}

/// Manages the spawned child process.
pub struct ChildProcess {
    child: Child,
    pub(crate) input: ChildInput,
}

/// The output stream handed to the reader task.
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

impl ChildProcess {
    /// Spawn `command` with `options`, returning the process and the
    /// monitored output stream separately.
    pub fn spawn(command: &str, args: &[String], options: &SpawnOptions) -> Result<(Self, OutputReader)> {
        let mut child = options
            .command(command, args)
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;
        debug!(command, ?args, pid = child.id(), "spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (monitored, other): (Option<OutputReader>, Option<OutputReader>) = match options.stream {
            OutputStream::Stdout => (
                stdout.map(|s| Box::new(s) as OutputReader),
                stderr.map(|s| Box::new(s) as OutputReader),
            ),
            OutputStream::Stderr => (
                stderr.map(|s| Box::new(s) as OutputReader),
                stdout.map(|s| Box::new(s) as OutputReader),
            ),
        };
        if options.stdio == StdioMode::Piped {
            if let Some(other) = other {
                spawn_drain(other);
            }
        }

        let missing = |what: &str| Error::Spawn {
            command: command.to_string(),
            source: io::Error::other(format!("{what} was not captured")),
        };
        let reader = monitored.ok_or_else(|| missing("monitored output stream"))?;
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;

        let process = ChildProcess {
            child,
            input: ChildInput { stdin: Some(stdin) },
        };
        Ok((process, reader))
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Ask the child to die. Failures are logged and otherwise ignored.
    pub fn kill(&mut self) {
        match self.child.start_kill() {
            Ok(()) => warn!(pid = self.child.id(), "killed child process"),
            Err(err) => debug!(%err, "kill failed"),
        }
    }

    /// Wait for the child process to exit.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        // Nothing more will be written once we are only waiting.
        self.input.stdin = None;
        self.child.wait().await
    }
}

/// The child's stdin, closed by `eof`.
pub(crate) struct ChildInput {
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl ProcessInput for ChildInput {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(Error::InputClosed {
                line: line.to_string(),
            });
        };

        let mut data = line.as_bytes().to_vec();
        data.push(b'\n');
        let written = match stdin.write_all(&data).await {
            Ok(()) => stdin.flush().await,
            Err(err) => Err(err),
        };
        match written {
            Ok(()) => Ok(()),
            // The child is already gone; its exit decides the outcome.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                warn!(line, "child closed its input before the line was sent");
                Ok(())
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            match stdin.shutdown().await {
                Err(err) if err.kind() != io::ErrorKind::BrokenPipe => return Err(err),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::Code(0).to_string(), "exit code 0");
        assert_eq!(Termination::Signal(9).to_string(), "signal 9");
    }

    #[cfg(unix)]
    #[test]
    fn test_termination_prefers_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(Termination::from(ExitStatus::from_raw(9)), Termination::Signal(9));
        assert_eq!(Termination::from(ExitStatus::from_raw(3 << 8)), Termination::Code(3));
    }

    #[tokio::test]
    async fn test_spawn_missing_command() {
        let result = ChildProcess::spawn("spawnscript-no-such-command", &[], &SpawnOptions::default());
        assert!(matches!(result, Err(Error::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_input_closed_after_eof() {
        let args = vec!["-c".to_string(), "cat".to_string()];
        let (mut process, _reader) = ChildProcess::spawn("sh", &args, &SpawnOptions::default()).unwrap();
        process.input.close().await.unwrap();
        let err = process.input.send_line("late").await.unwrap_err();
        assert!(matches!(err, Error::InputClosed { .. }));
        assert!(process.wait().await.unwrap().success());
    }
}

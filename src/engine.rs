use crate::commands::{Expect, SendEof, SendLine, Wait};
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::options::SpawnOptions;
use crate::output_reader::spawn_reader;
use crate::pattern::Pattern;
use crate::process::{ChildProcess, Termination};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Start building a scripted interaction with `command`.
pub fn spawn<I, S>(command: impl Into<String>, args: I) -> Engine
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Engine::new(command, args)
}

/// The result of a run whose script completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Every non-empty output line, colors removed, in arrival order.
    pub output: Vec<String>,
    pub exit: Termination,
}

/// Drives one child process through a queue of instructions.
///
/// Instructions are appended with the chaining methods, then [`run`](Self::run)
/// consumes the engine.
#[derive(Debug)]
pub struct Engine {
    command: String,
    args: Vec<String>,
    options: SpawnOptions,
    queue: Vec<Instruction>,
}

impl Engine {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Engine {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            options: SpawnOptions::default(),
            queue: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: SpawnOptions) -> Self {
        self.options = options;
        self
    }

    /// Assert the next output line contains (or matches) `pattern`.
    pub fn expect(self, pattern: impl Into<Pattern>) -> Self {
        self.push(Expect::new(pattern))
    }

    /// Skip output lines until one contains (or matches) `pattern`.
    pub fn wait(self, pattern: impl Into<Pattern>) -> Self {
        self.push(Wait::new(pattern))
    }

    /// Like [`wait`](Self::wait), handing the matching line to `on_match`.
    pub fn wait_with(
        self,
        pattern: impl Into<Pattern>,
        on_match: impl FnMut(&str) + Send + 'static,
    ) -> Self {
        self.push(Wait::with_callback(pattern, on_match))
    }

    /// Write `text` and a newline to the child's stdin.
    pub fn sendline(self, text: impl Into<String>) -> Self {
        self.push(SendLine::new(text))
    }

    /// Close the child's stdin.
    pub fn send_eof(self) -> Self {
        self.push(SendEof)
    }

    /// Append any instruction, e.g. one produced by the script parser.
    pub fn push(mut self, instruction: impl Into<Instruction>) -> Self {
        self.queue.push(instruction.into());
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.queue
    }

    /// Spawn the child and start executing the queue.
    ///
    /// Must be called from within a tokio runtime. A spawn failure does not
    /// panic or return early: it is the outcome reported by the handle.
    pub fn run(self) -> RunHandle {
        let (tx, rx) = oneshot::channel();
        let kill = Arc::new(Notify::new());

        let (process, reader) = match ChildProcess::spawn(&self.command, &self.args, &self.options) {
            Ok(spawned) => spawned,
            Err(err) => {
                warn!(command = %self.command, %err, "spawn failed");
                let _ = tx.send(Err(err));
                return RunHandle {
                    process: ProcessHandle { pid: None, kill },
                    outcome: rx,
                };
            }
        };

        let pid = process.id();
        let run = Run {
            process,
            output: spawn_reader(reader),
            dispatcher: Dispatcher::new(self.queue),
            kill: Arc::clone(&kill),
            timeout: self.options.timeout,
        };
        tokio::spawn(async move {
            let _ = tx.send(run.drive().await);
        });

        RunHandle {
            process: ProcessHandle { pid, kill },
            outcome: rx,
        }
    }

    /// Spawn the child and report the outcome to `on_complete`, exactly once.
    pub fn run_with<F>(self, on_complete: F) -> ProcessHandle
    where
        F: FnOnce(Result<Completion>) + Send + 'static,
    {
        let handle = self.run();
        let process = handle.process().clone();
        tokio::spawn(async move {
            on_complete(handle.wait().await);
        });
        process
    }
}

/// Caller-side supervision of a running child.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    kill: Arc<Notify>,
}

impl ProcessHandle {
    /// OS process id, `None` when the spawn failed.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Kill the child (best effort). The run then completes through the
    /// normal exit path.
    pub fn kill(&self) {
        self.kill.notify_one();
    }
}

/// A started run: supervise the child and await the single outcome.
#[derive(Debug)]
pub struct RunHandle {
    process: ProcessHandle,
    outcome: oneshot::Receiver<Result<Completion>>,
}

impl RunHandle {
    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }

    pub fn kill(&self) {
        self.process.kill();
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }

    /// Wait for the run to conclude.
    pub async fn wait(self) -> Result<Completion> {
        self.outcome.await.unwrap_or(Err(Error::Aborted))
    }
}

/// State owned by the task driving one run.
struct Run {
    process: ChildProcess,
    output: tokio::sync::mpsc::Receiver<std::io::Result<String>>,
    dispatcher: Dispatcher,
    kill: Arc<Notify>,
    timeout: Option<Duration>,
}

impl Run {
    async fn drive(mut self) -> Result<Completion> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let watchdog = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending().await,
            }
        };
        tokio::pin!(watchdog);
        let mut timed_out = false;

        loop {
            let kill_requested = tokio::select! {
                chunk = self.output.recv() => match chunk {
                    // A sendline blocks while the child is not reading its
                    // input, so kill and timeout stay live during dispatch.
                    Some(Ok(text)) => tokio::select! {
                        dispatched = self.dispatcher.dispatch_chunk(&text, &mut self.process.input) => {
                            if let Err(err) = dispatched {
                                self.process.kill();
                                return Err(err);
                            }
                            false
                        }
                        () = self.kill.notified() => {
                            debug!("kill requested during dispatch");
                            true
                        }
                        () = &mut watchdog, if !timed_out => {
                            warn!(timeout = ?self.timeout, "run timed out during dispatch");
                            timed_out = true;
                            true
                        }
                    },
                    Some(Err(err)) => {
                        self.process.kill();
                        return Err(Error::Io(err));
                    }
                    None => break,
                },
                () = self.kill.notified() => true,
                () = &mut watchdog, if !timed_out => {
                    warn!(timeout = ?self.timeout, "run timed out");
                    timed_out = true;
                    true
                }
            };
            if kill_requested {
                // A killed child may leave its output open through
                // grandchildren; stop reading and go straight to exit.
                self.process.kill();
                break;
            }
        }

        let status = loop {
            let kill_requested = tokio::select! {
                status = self.process.wait() => break status?,
                () = self.kill.notified() => true,
                () = &mut watchdog, if !timed_out => {
                    warn!(timeout = ?self.timeout, "run timed out");
                    timed_out = true;
                    true
                }
            };
            if kill_requested {
                self.process.kill();
            }
        };
        let exit = Termination::from(status);
        info!(%exit, "child exited");

        if timed_out && !self.dispatcher.is_done() {
            return Err(Error::TimedOut {
                after: self.timeout.unwrap_or_default(),
                pending: self.dispatcher.pending(),
            });
        }
        let output = self.dispatcher.finish()?;
        Ok(Completion { output, exit })
    }
}

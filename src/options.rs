//! [`SpawnOptions`] — how the child process is started and which of its
//! output streams the engine listens to.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// The output stream matched against the instruction queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStream {
    #[default]
    Stdout,
    Stderr,
}

/// Wiring for the output stream that is *not* monitored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
    /// Discarded at the OS level.
    #[default]
    Null,
    /// Shared with the parent process.
    Inherit,
    /// Piped and drained by the engine, contents discarded.
    Piped,
}

impl StdioMode {
    fn stdio(self) -> Stdio {
        match self {
            Self::Null => Stdio::null(),
            Self::Inherit => Stdio::inherit(),
            Self::Piped => Stdio::piped(),
        }
    }
}

/// Whether the command runs through a shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Shell {
    /// Execute the command directly.
    #[default]
    None,
    /// `/bin/sh -c` on Unix, `cmd.exe /d /s /c` on Windows.
    Default,
    /// Run through this shell with `-c` (`/d /s /c` for `cmd.exe`).
    Named(String),
}

/// Options for starting the child process.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub cwd: Option<PathBuf>,
    /// Replaces the child's environment entirely when set.
    pub env: Option<BTreeMap<String, String>>,
    /// Set on top of the inherited (or replaced) environment.
    pub extra_env: BTreeMap<String, String>,
    pub stdio: StdioMode,
    /// Start the child in its own process group (Unix only).
    pub detached: bool,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub stream: OutputStream,
    pub shell: Shell,
    /// Kill the child if the run has not finished after this long.
    pub timeout: Option<Duration>,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add one variable to the replacement environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the child's environment with `vars`.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Set one variable without clearing the inherited environment.
    pub fn extend_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    pub fn stdio(mut self, mode: StdioMode) -> Self {
        self.stdio = mode;
        self
    }

    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn stream(mut self, stream: OutputStream) -> Self {
        self.stream = stream;
        self
    }

    pub fn shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the command for `program` and `args` with every option applied.
    pub(crate) fn command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::from(self.std_command(program, args));
        cmd.kill_on_drop(true);
        cmd
    }

    fn std_command(&self, program: &str, args: &[String]) -> StdCommand {
        let mut cmd = match &self.shell {
            Shell::None => {
                let mut cmd = StdCommand::new(program);
                cmd.args(args);
                cmd
            }
            Shell::Default => shell_command(default_shell(), program, args),
            Shell::Named(shell) => shell_command(shell, program, args),
        };

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        if let Some(env) = &self.env {
            cmd.env_clear();
            cmd.envs(env);
        }
        cmd.envs(&self.extra_env);

        let (stdout, stderr) = match self.stream {
            OutputStream::Stdout => (Stdio::piped(), self.stdio.stdio()),
            OutputStream::Stderr => (self.stdio.stdio(), Stdio::piped()),
        };
        cmd.stdin(Stdio::piped()).stdout(stdout).stderr(stderr);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if self.detached {
                cmd.process_group(0);
            }
            if let Some(uid) = self.uid {
                cmd.uid(uid);
            }
            if let Some(gid) = self.gid {
                cmd.gid(gid);
            }
        }

        cmd
    }
}

#[cfg(unix)]
fn default_shell() -> &'static str {
    "/bin/sh"
}

#[cfg(windows)]
fn default_shell() -> &'static str {
    "cmd.exe"
}

/// Join the command line with spaces and hand it to `shell`.
fn shell_command(shell: &str, program: &str, args: &[String]) -> StdCommand {
    let line = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = StdCommand::new(shell);
    if is_cmd_exe(shell) {
        cmd.args(["/d", "/s", "/c"]).arg(line);
    } else {
        cmd.arg("-c").arg(line);
    }
    cmd
}

fn is_cmd_exe(shell: &str) -> bool {
    let lower = shell.to_ascii_lowercase();
    lower.ends_with("cmd") || lower.ends_with("cmd.exe")
}

//! The [`Error`] type every run of an [`Engine`](crate::Engine) can end with.

use crate::pattern::Pattern;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Why a scripted run failed.
///
/// Every variant is terminal: the run is over, the remaining instructions are
/// abandoned and the child has been killed (best effort) where it was still
/// running.
#[derive(Debug, Error)]
pub enum Error {
    /// The child process could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Reading the monitored output or writing to the child's input failed.
    #[error("process stream error: {0}")]
    Io(#[from] io::Error),

    /// An `expect` (or, at exit, the final `wait`) did not match its line.
    #[error("expected {line:?} {} {pattern}", .pattern.verb())]
    Mismatch { line: String, pattern: Pattern },

    /// The child exited without printing a single line.
    #[error("child exited with no output; pending: {}", .pending.join(", "))]
    NoOutput { pending: Vec<String> },

    /// The child exited while more than one instruction was still queued.
    #[error("expecting more output when child exited; pending: {}", .pending.join(", "))]
    PrematureExit { pending: Vec<String> },

    /// The last queued instruction was a `sendline` and the child is gone.
    #[error("cannot send {line:?} after the process has exited")]
    SendAfterExit { line: String },

    /// A `sendline` ran after the input stream had been closed by `eof`.
    #[error("cannot send {line:?}: input stream already closed")]
    InputClosed { line: String },

    /// The run watchdog killed the child before the script completed.
    #[error("timed out after {after:?}; pending: {}", .pending.join(", "))]
    TimedOut {
        after: Duration,
        pending: Vec<String>,
    },

    /// The task driving the run stopped without reporting an outcome.
    #[error("interaction ended without reporting an outcome")]
    Aborted,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_for_literal() {
        let err = Error::Mismatch {
            line: "goodbye".into(),
            pattern: Pattern::from("hello"),
        };
        assert_eq!(err.to_string(), r#"expected "goodbye" to contain hello"#);
    }

    #[test]
    fn test_mismatch_message_for_regex() {
        let err = Error::Mismatch {
            line: "goodbye".into(),
            pattern: Pattern::regex("^hello$").unwrap(),
        };
        assert_eq!(err.to_string(), r#"expected "goodbye" to match /^hello$/"#);
    }

    #[test]
    fn test_pending_listed() {
        let err = Error::PrematureExit {
            pending: vec!["[wait] second".into(), "[sendline] B".into()],
        };
        let message = err.to_string();
        assert!(message.contains("[wait] second, [sendline] B"), "got: {message}");
    }
}

//! The [`ScriptCommand`] trait and the [`ProcessInput`] seam side-effecting
//! instructions write through.

use crate::instruction::Instruction;
use anyhow::Result;
use async_trait::async_trait;
use std::io;

/// The child's input stream, as seen by `sendline` and `eof`.
///
/// The engine implements this over the child's stdin; tests use an in-memory
/// recorder.
#[async_trait]
pub trait ProcessInput: Send {
    /// Write `line` followed by a newline.
    async fn send_line(&mut self, line: &str) -> crate::Result<()>;

    /// Close the input stream so the child sees end-of-file.
    async fn close(&mut self) -> io::Result<()>;
}

/// A single script instruction keyword.
///
/// Implement this trait to teach the script parser a new instruction. Then:
///
/// 1. Define `pub const NAME: &'static str` on your struct — the script
///    keyword (e.g. `"expect"`, `"sendline"`) used by the parser.
/// 2. Re-export the struct from `src/commands/mod.rs`.
/// 3. Add one entry to the `REGISTRY` in [`crate::parser`]:
///    `(MyCmd::NAME, MyCmd::parse_instruction)`.
pub trait ScriptCommand: Into<Instruction> + 'static {
    /// The script keyword, accessible at runtime.
    ///
    /// Implementations should return their `NAME` constant:
    /// `fn name(&self) -> &'static str { Self::NAME }`.
    fn name(&self) -> &'static str;

    /// Parse this command from the argument string (everything after the
    /// keyword on the script line).
    fn parse(args: &str) -> Result<Self>
    where
        Self: Sized;

    /// Parse and convert to an [`Instruction`]. Used as the function-pointer
    /// type stored in the parser registry.
    fn parse_instruction(args: &str) -> Result<Instruction>
    where
        Self: Sized,
    {
        Ok(Self::parse(args)?.into())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ProcessInput;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::io;

    /// Records everything written to it instead of talking to a process.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingInput {
        pub sent: Vec<String>,
        pub closed: bool,
    }

    #[async_trait]
    impl ProcessInput for RecordingInput {
        async fn send_line(&mut self, line: &str) -> crate::Result<()> {
            if self.closed {
                return Err(Error::InputClosed {
                    line: line.to_string(),
                });
            }
            self.sent.push(line.to_string());
            Ok(())
        }

        async fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
    }
}

//! [`Instruction`] — one queued step of a scripted interaction.

use crate::command::{ProcessInput, ScriptCommand};
use crate::commands::{Expect, SendEof, SendLine, Wait};

/// The kind of an [`Instruction`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Expect,
    Wait,
    SendLine,
    SendEof,
}

impl InstructionKind {
    /// `expect` and `wait` hold the queue until a line arrives; the others
    /// fire as soon as they reach the head.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Expect | Self::Wait)
    }
}

/// One queued unit of interaction.
#[derive(Debug)]
pub enum Instruction {
    Expect(Expect),
    Wait(Wait),
    SendLine(SendLine),
    SendEof(SendEof),
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Self::Expect(_) => InstructionKind::Expect,
            Self::Wait(_) => InstructionKind::Wait,
            Self::SendLine(_) => InstructionKind::SendLine,
            Self::SendEof(_) => InstructionKind::SendEof,
        }
    }

    /// The script keyword for this instruction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expect(cmd) => cmd.name(),
            Self::Wait(cmd) => cmd.name(),
            Self::SendLine(cmd) => cmd.name(),
            Self::SendEof(cmd) => cmd.name(),
        }
    }

    /// Human-readable form used when listing instructions that never ran,
    /// e.g. `[expect] hello` or `[sendline] yes`.
    pub fn description(&self) -> String {
        match self {
            Self::Expect(cmd) => format!("[{}] {}", cmd.name(), cmd.pattern),
            Self::Wait(cmd) => format!("[{}] {}", cmd.name(), cmd.pattern),
            Self::SendLine(cmd) => format!("[{}] {}", cmd.name(), cmd.text),
            Self::SendEof(cmd) => format!("[{}]", cmd.name()),
        }
    }

    /// Run the side effect of a `sendline` or `eof`, consuming the
    /// instruction. Pattern instructions have none.
    pub(crate) async fn perform(self, input: &mut dyn ProcessInput) -> crate::Result<()> {
        match self {
            Self::SendLine(cmd) => cmd.perform(input).await,
            Self::SendEof(cmd) => cmd.perform(input).await,
            Self::Expect(_) | Self::Wait(_) => Ok(()),
        }
    }
}

impl From<Expect> for Instruction {
    fn from(cmd: Expect) -> Self {
        Self::Expect(cmd)
    }
}

impl From<Wait> for Instruction {
    fn from(cmd: Wait) -> Self {
        Self::Wait(cmd)
    }
}

impl From<SendLine> for Instruction {
    fn from(cmd: SendLine) -> Self {
        Self::SendLine(cmd)
    }
}

impl From<SendEof> for Instruction {
    fn from(cmd: SendEof) -> Self {
        Self::SendEof(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn test_descriptions() {
        let instructions: Vec<Instruction> = vec![
            Expect::new("hello").into(),
            Wait::new(Pattern::regex("^second$").unwrap()).into(),
            SendLine::new("yes").into(),
            SendEof.into(),
        ];
        let descriptions: Vec<String> = instructions.iter().map(Instruction::description).collect();
        assert_eq!(
            descriptions,
            vec!["[expect] hello", "[wait] /^second$/", "[sendline] yes", "[eof]"]
        );
    }

    #[test]
    fn test_blocking_kinds() {
        assert!(InstructionKind::Expect.is_blocking());
        assert!(InstructionKind::Wait.is_blocking());
        assert!(!InstructionKind::SendLine.is_blocking());
        assert!(!InstructionKind::SendEof.is_blocking());
    }
}

//! The line dispatcher: matches incoming output against the head of the
//! instruction queue and resolves whatever is left when the child exits.

use crate::command::ProcessInput;
use crate::error::{Error, Result};
use crate::instruction::{Instruction, InstructionKind};
use regex::Regex;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::debug;

static COLOR_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[\d{0,2}m").unwrap_or_else(|err| panic!("invalid color escape regex: {err}"))
});

/// Remove terminal color escapes (`ESC [ <0-2 digits> m`) from `text`.
pub fn strip_colors(text: &str) -> Cow<'_, str> {
    COLOR_ESCAPE.replace_all(text, "")
}

/// Owns the instruction queue and the record of every line seen.
#[derive(Debug)]
pub struct Dispatcher {
    queue: VecDeque<Instruction>,
    output: Vec<String>,
}

impl Dispatcher {
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self {
            queue: instructions.into_iter().collect(),
            output: Vec::new(),
        }
    }

    /// Every non-empty line recorded so far, in arrival order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Descriptions of the instructions that have not run yet.
    pub fn pending(&self) -> Vec<String> {
        self.queue.iter().map(Instruction::description).collect()
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handle one chunk of output from the child.
    ///
    /// All content-bearing lines of the chunk are recorded first, then each
    /// is dispatched in order. The first error stops processing.
    pub async fn dispatch_chunk(&mut self, chunk: &str, input: &mut dyn ProcessInput) -> Result<()> {
        let cleaned = strip_colors(chunk);
        let lines: Vec<&str> = cleaned.split('\n').filter(|line| !line.is_empty()).collect();
        if lines.is_empty() {
            return Ok(());
        }

        let first = self.output.len();
        self.output.extend(lines.iter().map(|line| (*line).to_string()));
        for index in first..self.output.len() {
            let line = self.output[index].clone();
            debug!(line = %line, "output");
            self.dispatch_line(&line, input).await?;
        }
        Ok(())
    }

    /// Advance the queue as far as `line` allows.
    async fn dispatch_line(&mut self, line: &str, input: &mut dyn ProcessInput) -> Result<()> {
        let mut previous: Option<InstructionKind> = None;
        loop {
            let Some(kind) = self.queue.front().map(Instruction::kind) else {
                return Ok(());
            };
            // An expect always gets a line of its own.
            if kind == InstructionKind::Expect && previous.is_some_and(InstructionKind::is_blocking) {
                return Ok(());
            }

            match kind {
                InstructionKind::Expect => {
                    if let Some(Instruction::Expect(expect)) = self.queue.pop_front() {
                        expect.check(line)?;
                        debug!(pattern = %expect.pattern, "expect satisfied");
                    }
                }
                InstructionKind::Wait => {
                    let matched = match self.queue.front_mut() {
                        Some(Instruction::Wait(wait)) => wait.try_match(line),
                        _ => false,
                    };
                    if !matched {
                        return Ok(());
                    }
                    if let Some(instruction) = self.queue.pop_front() {
                        debug!(instruction = %instruction.description(), "wait satisfied");
                    }
                }
                InstructionKind::SendLine | InstructionKind::SendEof => {
                    if let Some(instruction) = self.queue.pop_front() {
                        debug!(instruction = %instruction.description(), "performing");
                        instruction.perform(input).await?;
                    }
                    let next_blocks = self
                        .queue
                        .front()
                        .is_none_or(|next| next.kind().is_blocking());
                    if next_blocks {
                        return Ok(());
                    }
                }
            }
            previous = Some(kind);
        }
    }

    /// Resolve the queue once the child has exited, yielding the recorded
    /// output on success.
    pub fn finish(mut self) -> Result<Vec<String>> {
        if self.queue.is_empty() {
            return Ok(self.output);
        }

        let pending = self.pending();
        let Some(last_line) = self.output.last().cloned() else {
            return Err(Error::NoOutput { pending });
        };
        if self.queue.len() > 1 {
            return Err(Error::PrematureExit { pending });
        }

        match self.queue.pop_front() {
            Some(Instruction::SendLine(send)) => Err(Error::SendAfterExit { line: send.text }),
            Some(Instruction::Expect(expect)) => {
                expect.check(&last_line)?;
                Ok(self.output)
            }
            Some(Instruction::Wait(mut wait)) => {
                if wait.try_match(&last_line) {
                    Ok(self.output)
                } else {
                    Err(Error::Mismatch {
                        line: last_line,
                        pattern: wait.pattern,
                    })
                }
            }
            Some(Instruction::SendEof(_)) | None => Ok(self.output),
        }
    }
}

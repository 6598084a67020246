//! [`Expect`] instruction — asserts the next output line matches a pattern.
//!
//! Script syntax:
//! - `expect "hello"` — the line must contain `hello`
//! - `expect /^hello$/` — the line must match the regular expression

use crate::command::ScriptCommand;
use crate::error::Error;
use crate::parser::parse_pattern;
use crate::pattern::Pattern;
use anyhow::Result;

/// Asserts that the next available output line matches `pattern`.
///
/// A mismatch is fatal: the run ends with [`Error::Mismatch`] and the child
/// is killed.
#[derive(Debug, Clone)]
pub struct Expect {
    pub pattern: Pattern,
}

impl Expect {
    pub const NAME: &'static str = "expect";

    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Test `line`, turning a mismatch into the error the run fails with.
    pub fn check(&self, line: &str) -> crate::Result<()> {
        if self.pattern.matches(line) {
            Ok(())
        } else {
            Err(Error::Mismatch {
                line: line.to_string(),
                pattern: self.pattern.clone(),
            })
        }
    }
}

impl ScriptCommand for Expect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self::new(parse_pattern(args)?))
    }
}

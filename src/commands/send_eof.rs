//! [`SendEof`] instruction — closes the program's stdin.
//!
//! Script syntax: `eof`

use crate::command::{ProcessInput, ScriptCommand};
use anyhow::{Result, anyhow};

/// Closes the program's input stream so it reads end-of-file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendEof;

impl SendEof {
    pub const NAME: &'static str = "eof";

    pub async fn perform(&self, input: &mut dyn ProcessInput) -> crate::Result<()> {
        input.close().await?;
        Ok(())
    }
}

impl ScriptCommand for SendEof {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        if args.trim().is_empty() {
            Ok(Self)
        } else {
            Err(anyhow!("'eof' takes no arguments, got: {}", args.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingInput;

    #[test]
    fn test_parse() {
        assert!(SendEof::parse("").is_ok());
        assert!(SendEof::parse("  ").is_ok());
        assert!(SendEof::parse("now").is_err());
    }

    #[tokio::test]
    async fn test_perform_closes_input() {
        let mut input = RecordingInput::default();
        SendEof.perform(&mut input).await.unwrap();
        assert!(input.closed);
    }
}

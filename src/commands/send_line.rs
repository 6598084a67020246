//! [`SendLine`] instruction — writes a line to the program's stdin.
//!
//! Script syntax: `sendline "text here"`

use crate::command::{ProcessInput, ScriptCommand};
use crate::parser::parse_quoted_string;
use anyhow::Result;

/// Writes `text` followed by a newline to the program's input.
///
/// Fires as soon as it reaches the head of the queue behind a satisfied
/// `expect`/`wait`; it never waits for output of its own.
#[derive(Debug, Clone)]
pub struct SendLine {
    pub text: String,
}

impl SendLine {
    pub const NAME: &'static str = "sendline";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub async fn perform(&self, input: &mut dyn ProcessInput) -> crate::Result<()> {
        input.send_line(&self.text).await
    }
}

impl ScriptCommand for SendLine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self::new(parse_quoted_string(args)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingInput;

    #[test]
    fn test_parse() {
        let cmd = SendLine::parse(r#""hello""#).unwrap();
        assert_eq!(cmd.text, "hello");
    }

    #[test]
    fn test_parse_escapes() {
        let cmd = SendLine::parse(r#""say \"hi\"""#).unwrap();
        assert_eq!(cmd.text, r#"say "hi""#);

        let cmd = SendLine::parse(r#""C:\\new\\tmp""#).unwrap();
        assert_eq!(cmd.text, r"C:\new\tmp");
    }

    #[tokio::test]
    async fn test_perform_writes_line() {
        let mut input = RecordingInput::default();
        SendLine::new("yes").perform(&mut input).await.unwrap();
        assert_eq!(input.sent, vec!["yes".to_string()]);
    }
}

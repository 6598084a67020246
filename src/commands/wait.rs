//! [`Wait`] instruction — skips output lines until one matches.
//!
//! Script syntax: `wait "Password:"` or `wait /^\$ $/`

use crate::command::ScriptCommand;
use crate::parser::parse_pattern;
use crate::pattern::Pattern;
use anyhow::Result;
use std::fmt;

/// Callback invoked with the line that satisfied a [`Wait`].
pub type OnMatch = Box<dyn FnMut(&str) + Send>;

/// Discards non-matching lines until one matches `pattern`.
///
/// Never fails the run by itself; it stays at the head of the queue until it
/// is satisfied or the child exits.
pub struct Wait {
    pub pattern: Pattern,
    on_match: Option<OnMatch>,
}

impl Wait {
    pub const NAME: &'static str = "wait";

    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            on_match: None,
        }
    }

    /// Create a `Wait` that hands the matching line to `on_match`.
    pub fn with_callback(
        pattern: impl Into<Pattern>,
        on_match: impl FnMut(&str) + Send + 'static,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            on_match: Some(Box::new(on_match)),
        }
    }

    /// Test `line`; on a match the callback runs before this returns `true`.
    pub fn try_match(&mut self, line: &str) -> bool {
        if !self.pattern.matches(line) {
            return false;
        }
        if let Some(on_match) = self.on_match.as_mut() {
            on_match(line);
        }
        true
    }
}

impl fmt::Debug for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("pattern", &self.pattern)
            .field("on_match", &self.on_match.is_some())
            .finish()
    }
}

impl ScriptCommand for Wait {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self> {
        Ok(Self::new(parse_pattern(args)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse() {
        let cmd = Wait::parse(r#""second""#).unwrap();
        assert!(cmd.pattern.matches("the second prompt"));
    }

    #[test]
    fn test_parse_unclosed_regex() {
        assert!(Wait::parse("/unclosed").is_err());
    }

    #[test]
    fn test_callback_only_sees_matching_line() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut wait = Wait::with_callback("first", move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        });

        assert!(!wait.try_match("booting"));
        assert!(wait.try_match("first prompt"));
        assert_eq!(*seen.lock().unwrap(), vec!["first prompt".to_string()]);
    }
}

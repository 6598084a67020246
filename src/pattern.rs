//! [`Pattern`] — what an `expect` or `wait` instruction looks for in a line.

use regex::Regex;
use std::fmt;

/// A line pattern: either a literal substring or a regular expression.
#[derive(Clone)]
pub enum Pattern {
    /// Matches any line containing the text.
    Literal(String),

    /// Matches any line the expression finds a match in.
    Regex(Regex),
}

impl Pattern {
    /// Create a literal substring pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile a regular-expression pattern.
    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(Regex::new(source)?))
    }

    /// Test a single output line against this pattern.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Literal(text) => line.contains(text.as_str()),
            Self::Regex(regex) => regex.is_match(line),
        }
    }

    /// The verb used when reporting a mismatch: "to contain" or "to match".
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Literal(_) => "to contain",
            Self::Regex(_) => "to match",
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "Literal({text:?})"),
            Self::Regex(regex) => write!(f, "Regex({:?})", regex.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_substring_match() {
        let pattern = Pattern::from("llo");
        assert!(pattern.matches("hello"));
        assert!(!pattern.matches("help"));
    }

    #[test]
    fn test_regex_match() {
        let pattern = Pattern::regex("^hello$").unwrap();
        assert!(pattern.matches("hello"));
        assert!(!pattern.matches("hello world"));
    }

    #[test]
    fn test_literal_is_not_interpreted_as_regex() {
        assert!(!Pattern::from("a.c").matches("abc"));
        assert!(Pattern::from("a.c").matches("xa.cx"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(Pattern::regex("(unclosed").is_err());
    }

    #[test]
    fn test_display_and_verb() {
        let literal = Pattern::from("ready");
        assert_eq!(literal.to_string(), "ready");
        assert_eq!(literal.verb(), "to contain");

        let regex = Pattern::from(Regex::new(r"\d+").unwrap());
        assert_eq!(regex.to_string(), r"/\d+/");
        assert_eq!(regex.verb(), "to match");
    }
}

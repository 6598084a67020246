//! Script parser for spawnscript interaction scripts.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`].

use crate::command::ScriptCommand;
use crate::commands::{Expect, SendEof, SendLine, Wait};
use crate::instruction::Instruction;
use crate::pattern::Pattern;
use anyhow::{Context as _, Result, anyhow};
use std::path::Path;
use std::time::Duration;

/// Parse a script from a string slice and return the resulting instructions.
///
/// Lines that are empty or start with `#` are ignored. Inline comments (` # …`)
/// are stripped while preserving `#` characters inside quoted strings and
/// `/regex/` patterns.
///
/// # Errors
///
/// Returns an error if any line contains an unknown instruction, a malformed
/// argument, an invalid regular expression, or an unclosed string.
///
/// # Example
///
/// ```
/// use spawnscript::parse_str;
///
/// let instructions = parse_str("expect \"$ \"\nsendline \"echo hi\"\n").unwrap();
/// assert_eq!(instructions.len(), 2);
/// ```
pub fn parse_str(content: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = strip_inline_comment(line);
        let instruction = parse_line(line)
            .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
        instructions.push(instruction);
    }
    Ok(instructions)
}

/// Parse a script from a file and return the resulting instructions.
///
/// Reads the entire file into memory and delegates to [`parse_str`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or if the script is malformed.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Instruction>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script file: {}", path.display()))?;
    parse_str(&content)
}

type ParseFn = fn(&str) -> Result<Instruction>;

static REGISTRY: &[(&str, ParseFn)] = &[
    (Expect::NAME, Expect::parse_instruction),
    (Wait::NAME, Wait::parse_instruction),
    (SendLine::NAME, SendLine::parse_instruction),
    (SendEof::NAME, SendEof::parse_instruction),
];

/// Dispatch a single non-empty, non-comment line to the matching parser.
///
/// To add a new instruction, add one entry to [`REGISTRY`] using the command's
/// `NAME` constant and `parse_instruction` function pointer.
fn parse_line(line: &str) -> Result<Instruction> {
    let (name, args) = line.split_once(' ').unwrap_or((line, ""));
    REGISTRY
        .iter()
        .find(|(cmd_name, _)| *cmd_name == name)
        .map(|(_, parse)| parse(args))
        .unwrap_or_else(|| Err(anyhow!("Unknown instruction: {}", line)))
}

/// Strip inline comments from a line, preserving `#` inside quoted strings
/// and regex literals.
fn strip_inline_comment(line: &str) -> &str {
    let mut delimiter: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        match delimiter {
            Some(open) if ch == open => delimiter = None,
            Some(_) => {}
            None if ch == '"' || ch == '/' => delimiter = Some(ch),
            None if ch == '#' => return line[..i].trim(),
            None => {}
        }
    }
    line
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        Duration::try_from_secs_f64(secs).context("Invalid seconds value")
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}

/// Parse a double-quoted string, processing `\n`, `\t`, `\"`, and `\\`.
pub(crate) fn parse_quoted_string(s: &str) -> Result<String> {
    let s = s.trim();
    if !s.starts_with('"') {
        return Err(anyhow!("Expected string to start with '\"'"));
    }
    if s.len() < 2 || !s.ends_with('"') {
        return Err(anyhow!("Expected string to end with '\"'"));
    }

    let mut out = String::with_capacity(s.len() - 2);
    let mut chars = s[1..s.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            // Unknown escapes are kept as written.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// Parse a pattern argument: `"literal"` or `/regex/` (`\/` for a slash).
pub(crate) fn parse_pattern(s: &str) -> Result<Pattern> {
    let s = s.trim();
    if s.starts_with('"') {
        return Ok(Pattern::Literal(parse_quoted_string(s)?));
    }
    let Some(body) = s.strip_prefix('/') else {
        return Err(anyhow!("Expected a quoted string or /regex/, got: {}", s));
    };
    let source = body
        .strip_suffix('/')
        .filter(|inner| !inner.ends_with('\\') || inner.ends_with("\\\\"))
        .ok_or_else(|| anyhow!("Unclosed regex: {}", s))?;
    let source = source.replace("\\/", "/");
    Pattern::regex(&source).with_context(|| format!("Invalid regex: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::InstructionKind;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::from_secs_f64(1.5)
        );
        assert!(parse_duration("5minutes").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("nans").is_err());
        assert!(parse_duration("infs").is_err());
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse_quoted_string("\"hello\"").unwrap(), "hello");
        assert_eq!(
            parse_quoted_string("\"hello world\"").unwrap(),
            "hello world"
        );
        assert_eq!(
            parse_quoted_string("\"hello\\nworld\"").unwrap(),
            "hello\nworld"
        );
        assert!(parse_quoted_string("\"").is_err());
    }

    #[test]
    fn test_parse_quoted_string_escaped_backslash() {
        assert_eq!(parse_quoted_string(r#""C:\\new""#).unwrap(), r"C:\new");
        assert_eq!(parse_quoted_string(r#""a\\tb""#).unwrap(), r"a\tb");
        assert_eq!(parse_quoted_string(r#""say \"hi\"""#).unwrap(), r#"say "hi""#);
        assert_eq!(parse_quoted_string(r#""\d+""#).unwrap(), r"\d+");
    }

    #[test]
    fn test_parse_pattern() {
        assert!(matches!(parse_pattern("\"a/b\"").unwrap(), Pattern::Literal(text) if text == "a/b"));

        let regex = parse_pattern(r"/^path: \/usr$/").unwrap();
        assert!(regex.matches("path: /usr"));
        assert_eq!(regex.to_string(), "/^path: /usr$/");

        assert!(parse_pattern("/([/").is_err());
        assert!(parse_pattern(r"/open\/").is_err());
        assert!(parse_pattern("bare").is_err());
    }

    #[test]
    fn test_parse_all_instructions() {
        let instructions = parse_str(
            "wait \"first\"\nsendline \"A\"\nexpect /^A$/\neof\n",
        )
        .unwrap();
        let kinds: Vec<InstructionKind> = instructions.iter().map(Instruction::kind).collect();
        assert_eq!(
            kinds,
            vec![
                InstructionKind::Wait,
                InstructionKind::SendLine,
                InstructionKind::Expect,
                InstructionKind::SendEof,
            ]
        );
        let names: Vec<&str> = instructions.iter().map(Instruction::name).collect();
        assert_eq!(names, vec!["wait", "sendline", "expect", "eof"]);
    }

    #[test]
    fn test_parse_comments_only() {
        assert_eq!(parse_str("# c1\n# c2\n").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_empty_lines() {
        let instructions = parse_str("\n\nexpect \"x\"\n\nsendline \"test\"\n\n").unwrap();
        assert_eq!(instructions.len(), 2);
    }

    #[test]
    fn test_parse_invalid_instruction() {
        let err = format!("{:#}", parse_str("unknown_command \"test\"").unwrap_err());
        assert!(err.contains("Unknown instruction"), "got: {err}");
        assert!(err.contains("line 1"), "got: {err}");
    }

    #[test]
    fn test_parse_unclosed_quote() {
        assert!(parse_str("sendline \"unclosed").is_err());
    }

    #[test]
    fn test_strip_inline_comments() {
        assert_eq!(strip_inline_comment("eof # comment"), "eof");
        assert_eq!(
            strip_inline_comment("sendline \"test\" # inline"),
            "sendline \"test\""
        );
        assert_eq!(
            strip_inline_comment("sendline \"#hashtag\""),
            "sendline \"#hashtag\""
        );
        assert_eq!(
            strip_inline_comment("expect /#\\d+/ # issue number"),
            "expect /#\\d+/"
        );
    }

    #[test]
    fn test_parse_with_inline_comments() {
        let instructions =
            parse_str("wait \"ready\" # banner\nsendline \"hi\" # greet\nexpect \"hi\"\n").unwrap();
        assert_eq!(instructions.len(), 3);
    }
}

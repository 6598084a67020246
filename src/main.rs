use anyhow::{Context, Result, anyhow};
use clap::Parser;
use spawnscript::{Engine, OutputStream, Shell, SpawnOptions, parse_duration, parse_file};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "spawnscript",
    about = "Run an expect/wait/sendline script against a command",
    version
)]
struct Args {
    /// Path to the script file
    #[arg(short, long)]
    script: PathBuf,

    /// Match against stderr instead of stdout
    #[arg(long)]
    stderr: bool,

    /// Working directory for the command
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Extra environment variable for the command (KEY=VALUE, repeatable)
    #[arg(short, long = "env", value_parser = parse_env_var)]
    env: Vec<(String, String)>,

    /// Run the command through a shell (`--shell` or `--shell=/bin/bash`)
    #[arg(long, num_args = 0..=1, require_equals = true, value_name = "SHELL")]
    shell: Option<Option<String>>,

    /// Kill the command if the script has not finished after this long (e.g. 500ms, 5s)
    #[arg(short, long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Command to run
    command: String,

    /// Arguments to pass to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("spawnscript=debug")
        } else {
            EnvFilter::new("spawnscript=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let instructions = parse_file(&args.script)
        .with_context(|| format!("Failed to parse script file: {}", args.script.display()))?;

    let options = spawn_options(&args);
    let engine = instructions
        .into_iter()
        .fold(Engine::new(&args.command, &args.args).with_options(options), Engine::push);

    let completion = engine
        .run()
        .wait()
        .await
        .with_context(|| format!("Script failed against `{}`", args.command))?;

    for line in &completion.output {
        println!("{line}");
    }
    eprintln!("{} finished: {}", args.command, completion.exit);

    Ok(())
}

fn spawn_options(args: &Args) -> SpawnOptions {
    let mut options = SpawnOptions::new();
    if let Some(dir) = &args.cwd {
        options = options.cwd(dir);
    }
    for (key, value) in &args.env {
        options = options.extend_env(key, value);
    }
    if args.stderr {
        options = options.stream(OutputStream::Stderr);
    }
    options = match &args.shell {
        None => options,
        Some(None) => options.shell(Shell::Default),
        Some(Some(shell)) => options.shell(Shell::Named(shell.clone())),
    };
    if let Some(timeout) = args.timeout {
        options = options.timeout(timeout);
    }
    options
}

fn parse_env_var(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
    if key.is_empty() {
        return Err(anyhow!("empty variable name in: {s}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_layers_over_inherited_environment() {
        let args = Args::parse_from([
            "spawnscript", "-s", "script.txt", "-e", "FOO=bar", "-e", "EMPTY=", "sh",
        ]);
        let options = spawn_options(&args);
        assert!(options.env.is_none());
        assert_eq!(options.extra_env.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(options.extra_env.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_env_var() {
        assert_eq!(
            parse_env_var("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
        assert!(parse_env_var("novalue").is_err());
        assert!(parse_env_var("=x").is_err());
    }
}

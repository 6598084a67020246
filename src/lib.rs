//! # spawnscript
//!
//! An expect-style engine for scripting conversations with interactive
//! command-line programs.
//!
//! spawnscript spawns one child process and works through an ordered queue of
//! instructions against its output, line by line: asserting what the next line
//! says, skipping lines until one appears, writing input lines, and closing the
//! input stream. It is useful for testing CLI tools that prompt for input or
//! print progress.
//!
//! ## Quick start
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let completion = spawnscript::spawn("sh", ["-c", "echo ready; read name; echo hi $name"])
//!         .expect("ready")
//!         .sendline("world")
//!         .expect("hi world")
//!         .run()
//!         .wait()
//!         .await?;
//!
//!     assert_eq!(completion.output, ["ready", "hi world"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Instructions
//!
//! | Builder | Script | Description |
//! |---------|--------|-------------|
//! | `expect(p)` | `expect "text"` / `expect /re/` | The next line must contain / match `p`; fatal otherwise |
//! | `wait(p)` | `wait "text"` / `wait /re/` | Skip lines until one contains / matches `p` |
//! | `sendline(t)` | `sendline "text"` | Write `t` and a newline to the child's stdin |
//! | `send_eof()` | `eof` | Close the child's stdin |
//!
//! Instructions run strictly in order. `sendline` and `eof` never wait for
//! output: they fire as soon as the `expect` or `wait` in front of them is
//! satisfied. Color escapes are removed from the output before matching.
//!
//! When the child exits, whatever is left in the queue decides the outcome;
//! see [`Error`] for every way a run can fail.
//!
//! ## Scripts
//!
//! [`parse_str`] and [`parse_file`] read the script syntax above, one
//! instruction per line with `#` comments, into instructions that can be
//! [`push`](Engine::push)ed onto an engine.

pub mod command;
pub mod commands;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod options;
pub(crate) mod output_reader;
pub mod parser;
pub mod pattern;
pub mod process;

pub use command::{ProcessInput, ScriptCommand};
pub use commands::{Expect, OnMatch, SendEof, SendLine, Wait};
pub use dispatcher::{Dispatcher, strip_colors};
pub use engine::{Completion, Engine, ProcessHandle, RunHandle, spawn};
pub use error::{Error, Result};
pub use instruction::{Instruction, InstructionKind};
pub use options::{OutputStream, Shell, SpawnOptions, StdioMode};
pub use parser::{parse_duration, parse_file, parse_str};
pub use pattern::Pattern;
pub use process::Termination;

//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init [path]` | Write a default `taskplan.toml` |
//! | `plan <file>` | Validate tasks and print the execution plan |
//! | `validate <file>` | Print the validation report; non-zero exit when invalid |
//! | `suggest <file>` | List dependencies inferred from task titles |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) prints command context and enables debug-level
//! tracing on stderr:
//! ```bash
//! taskplan --verbose plan tasks.json --strategy critical_path
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod plan;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

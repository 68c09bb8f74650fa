//! # Storage Layer
//!
//! File-facing side of taskplan. The planning engine itself never touches
//! the filesystem; this layer loads its inputs.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSON / JSONL / YAML | any path given on the command line |
//! | Project config | TOML | `taskplan.toml` (nearest ancestor directory) |
//! | Global config | TOML | `~/.config/taskplan/config.toml` |
//!
//! ## Key Types
//!
//! - [`TaskFile`] - Read tasks from a file (shared lock via `fs2`)
//! - [`Config`] - Project and global configuration

mod config;
mod task_file;

pub use config::{
    Config, ConfigError, GlobalConfig, InferenceConfig, OutputFormat, ProjectConfig,
    WarningConfig, PROJECT_CONFIG_FILE,
};
pub use task_file::{parse_document, TaskFile, TaskFileError, TaskFileFormat, TaskRecord};

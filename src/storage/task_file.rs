//! Task file loading
//!
//! Reads the task list handed over by the task-generation step. Supported
//! formats, chosen by extension:
//!
//! | Extension | Layout |
//! |-----------|--------|
//! | `.json` | Array of task objects |
//! | `.jsonl` | One task object per line |
//! | `.yaml`, `.yml` | Sequence of task mappings |
//!
//! Reads take a shared file lock so a writer replacing the file is never
//! observed half-way.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Category, Priority, Task, TaskId};

#[derive(Debug, Error)]
pub enum TaskFileError {
    #[error("Unsupported task file format: '{0}' (expected .json, .jsonl, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Task file not found: {0}")]
    NotFound(PathBuf),
}

/// On-disk layout of a task file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFileFormat {
    Json,
    JsonLines,
    Yaml,
}

impl TaskFileFormat {
    /// Picks the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, TaskFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(TaskFileFormat::Json),
            "jsonl" => Ok(TaskFileFormat::JsonLines),
            "yaml" | "yml" => Ok(TaskFileFormat::Yaml),
            _ => Err(TaskFileError::UnsupportedFormat(ext)),
        }
    }
}

/// A task as written in a task file; the ID may be omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: Option<String>,

    pub title: String,

    #[serde(default, alias = "estimatedDurationHours")]
    pub estimated_duration_hours: Option<f64>,

    #[serde(default)]
    pub category: Category,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl TaskRecord {
    /// Converts to a task, deriving an ID from the title when missing
    pub fn into_task(self) -> Result<Task> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<TaskId>()
                .with_context(|| format!("Invalid ID for task '{}'", self.title))?,
            _ => TaskId::from_title(&self.title),
        };

        Ok(Task {
            id,
            title: self.title,
            estimated_duration_hours: self.estimated_duration_hours,
            category: self.category,
            priority: self.priority,
            dependencies: self.dependencies,
        })
    }
}

/// Reader for a task file
pub struct TaskFile {
    path: PathBuf,
}

impl TaskFile {
    /// Creates a reader for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the task file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all tasks, preserving file order
    pub fn read_all(&self) -> Result<Vec<Task>> {
        let format = TaskFileFormat::from_path(&self.path)?;

        if !self.path.exists() {
            return Err(TaskFileError::NotFound(self.path.clone()).into());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task file: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on task file")?;

        let mut content = String::new();
        BufReader::new(&file)
            .read_to_string(&mut content)
            .with_context(|| format!("Failed to read task file: {}", self.path.display()))?;
        let records = parse_document(&content, format)?;

        // Lock is released when file is dropped
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                record
                    .into_task()
                    .with_context(|| format!("Invalid task #{}", i + 1))
            })
            .collect()
    }
}

/// Parses task records from file content
pub fn parse_document(content: &str, format: TaskFileFormat) -> Result<Vec<TaskRecord>> {
    match format {
        TaskFileFormat::Json => {
            serde_json::from_str(content).context("Failed to parse JSON task list")
        }
        TaskFileFormat::Yaml => {
            if content.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_yaml::from_str(content).context("Failed to parse YAML task list")
        }
        TaskFileFormat::JsonLines => content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse task at line {}", i + 1))
            })
            .collect(),
    }
}

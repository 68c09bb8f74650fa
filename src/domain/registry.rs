//! Task registry
//!
//! Holds the immutable snapshot of tasks for one planning run. Registration
//! resolves title references to IDs, normalizes durations and records
//! duplicate IDs, so every later stage works on clean, ordered data.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::id::TaskId;
use super::task::{Category, Priority, Task};
use super::validation::{Issue, IssueKind};

/// A dependency reference after resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyRef {
    /// Refers to a task present in the registry
    Resolved(TaskId),
    /// Matches no task ID or title; kept so it can be reported
    Unresolved(String),
}

/// A task as registered for planning
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredTask {
    pub id: TaskId,
    pub title: String,
    /// Normalized, always finite and non-negative
    pub duration_hours: f64,
    pub category: Category,
    pub priority: Priority,
    /// Position in the input; second tie-break key after priority
    pub position: usize,
    pub dependencies: Vec<DependencyRef>,
}

/// Immutable snapshot of the tasks of one planning run
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Vec<RegisteredTask>,
    index: HashMap<TaskId, usize>,
    issues: Vec<Issue>,
    source: Vec<Task>,
    min_duration_hours: f64,
}

impl TaskRegistry {
    /// Registers tasks in input order
    ///
    /// `min_duration_hours` replaces missing, negative or non-finite
    /// estimates; each replacement raises an `InvalidDuration` warning.
    pub fn new(tasks: Vec<Task>, min_duration_hours: f64) -> Self {
        let min_duration_hours = if min_duration_hours.is_finite() && min_duration_hours >= 0.0 {
            min_duration_hours
        } else {
            0.0
        };

        let mut issues = Vec::new();
        let mut index: HashMap<TaskId, usize> = HashMap::new();
        let mut kept: Vec<&Task> = Vec::new();

        // First pass: claim IDs (first occurrence wins)
        for task in &tasks {
            if index.contains_key(&task.id) {
                warn!(task = %task.id, "duplicate task id ignored");
                issues.push(Issue::new(
                    IssueKind::DuplicateTaskId,
                    format!(
                        "Task ID {} is used more than once; '{}' was ignored",
                        task.id, task.title
                    ),
                    [task.id.to_string()],
                ));
                continue;
            }
            index.insert(task.id.clone(), kept.len());
            kept.push(task);
        }

        // Title lookup for references that are not IDs
        let mut titles: HashMap<String, TaskId> = HashMap::new();
        for task in &kept {
            titles
                .entry(normalize_title(&task.title))
                .or_insert_with(|| task.id.clone());
        }

        // Second pass: resolve references and normalize durations
        let mut registered = Vec::with_capacity(kept.len());
        for (position, task) in kept.iter().enumerate() {
            let mut dependencies: Vec<DependencyRef> = Vec::new();
            for reference in &task.dependencies {
                let resolved = resolve(reference, &index, &titles);
                if !dependencies.contains(&resolved) {
                    dependencies.push(resolved);
                }
            }

            let duration_hours = match task.estimated_duration_hours {
                Some(hours) if hours.is_finite() && hours >= 0.0 => hours,
                other => {
                    let shown = other
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "missing".to_string());
                    debug!(task = %task.id, duration = %shown, "using fallback duration");
                    issues.push(Issue::new(
                        IssueKind::InvalidDuration,
                        format!(
                            "Task {} has an invalid duration ({}); using {}h",
                            task.id, shown, min_duration_hours
                        ),
                        [task.id.to_string()],
                    ));
                    min_duration_hours
                }
            };

            registered.push(RegisteredTask {
                id: task.id.clone(),
                title: task.title.clone(),
                duration_hours,
                category: task.category,
                priority: task.priority,
                position,
                dependencies,
            });
        }

        debug!(
            tasks = registered.len(),
            issues = issues.len(),
            "registered task snapshot"
        );

        Self {
            tasks: registered,
            index,
            issues,
            source: tasks,
            min_duration_hours,
        }
    }

    /// Returns a new snapshot with one more task; `self` is unchanged
    pub fn with_task(&self, task: Task) -> Self {
        let mut tasks = self.source.clone();
        tasks.push(task);
        Self::new(tasks, self.min_duration_hours)
    }

    /// Registered tasks in input order
    pub fn tasks(&self) -> &[RegisteredTask] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&RegisteredTask> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Issues raised during registration (duplicates, durations)
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn min_duration_hours(&self) -> f64 {
        self.min_duration_hours
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Resolves a reference: exact ID first, then case-insensitive title
fn resolve(
    reference: &str,
    index: &HashMap<TaskId, usize>,
    titles: &HashMap<String, TaskId>,
) -> DependencyRef {
    if let Ok(id) = reference.parse::<TaskId>() {
        if index.contains_key(&id) {
            return DependencyRef::Resolved(id);
        }
    }

    match titles.get(&normalize_title(reference)) {
        Some(id) => DependencyRef::Resolved(id.clone()),
        None => DependencyRef::Unresolved(reference.trim().to_string()),
    }
}

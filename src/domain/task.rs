//! Task domain model
//!
//! Tasks are the units of work handed over by the task-generation step.
//! Each task declares the tasks it requires to be finished first, either by
//! ID or by title.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::TaskId;

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Project bootstrapping; expected to have no prerequisites
    Setup,
    Infrastructure,
    #[default]
    Feature,
    Testing,
    Documentation,
}

impl Category {
    /// Returns a display label for the category
    pub fn label(&self) -> &'static str {
        match self {
            Category::Setup => "setup",
            Category::Infrastructure => "infrastructure",
            Category::Feature => "feature",
            Category::Testing => "testing",
            Category::Documentation => "documentation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared priority of a task
///
/// Ordering is `Low < Medium < High`; the sorter prefers higher values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns a display label for the priority
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A generated task, as received from the task-generation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    /// Stable unique key
    pub id: TaskId,

    /// Display label
    pub title: String,

    /// Estimated effort; `None` or invalid values fall back to the
    /// configured minimum during registration
    #[serde(
        default,
        alias = "estimatedDurationHours",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_duration_hours: Option<f64>,

    #[serde(default)]
    pub category: Category,

    #[serde(default)]
    pub priority: Priority,

    /// References (IDs or titles) of tasks that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Task {
    /// Creates a new medium-priority feature task with no estimate
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            estimated_duration_hours: None,
            category: Category::default(),
            priority: Priority::default(),
            dependencies: Vec::new(),
        }
    }

    /// Sets the duration estimate
    pub fn with_duration(mut self, hours: f64) -> Self {
        self.estimated_duration_hours = Some(hours);
        self
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the category
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Adds a dependency reference (ID or title)
    pub fn depends_on(mut self, reference: impl Into<String>) -> Self {
        self.add_dependency(reference);
        self
    }

    /// Adds a dependency reference, ignoring exact duplicates
    pub fn add_dependency(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        if !self.dependencies.contains(&reference) {
            self.dependencies.push(reference);
        }
    }

    /// Removes a dependency reference
    pub fn remove_dependency(&mut self, reference: &str) {
        self.dependencies.retain(|d| d != reference);
    }

    /// Returns true if this task declares no dependencies
    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str) -> Task {
        Task::new(id.parse().unwrap(), format!("Task {}", id))
    }

    #[test]
    fn new_task_defaults() {
        let task = make_task("A");
        assert_eq!(task.category, Category::Feature);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.estimated_duration_hours.is_none());
        assert!(task.is_root());
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn task_dependencies() {
        let mut task = make_task("B").depends_on("A").depends_on("A");
        assert_eq!(task.dependencies, vec!["A".to_string()]);
        assert!(!task.is_root());

        task.add_dependency("Set up database");
        assert_eq!(task.dependencies.len(), 2);

        task.remove_dependency("A");
        assert_eq!(task.dependencies, vec!["Set up database".to_string()]);
    }

    #[test]
    fn deserializes_camel_case_duration() {
        let json = r#"{
            "id": "api",
            "title": "Build API",
            "estimatedDurationHours": 3.5,
            "category": "infrastructure",
            "priority": "high",
            "dependencies": ["db"]
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "api");
        assert_eq!(task.estimated_duration_hours, Some(3.5));
        assert_eq!(task.category, Category::Infrastructure);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.dependencies, vec!["db".to_string()]);
    }

    #[test]
    fn deserializes_with_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": "x", "title": "X"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Feature);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn serializes_snake_case() {
        let task = make_task("A")
            .with_duration(2.0)
            .with_category(Category::Setup)
            .with_priority(Priority::Low);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["estimated_duration_hours"], 2.0);
        assert_eq!(json["category"], "setup");
        assert_eq!(json["priority"], "low");
        assert!(json.get("dependencies").is_none());
    }
}

//! Validation report
//!
//! Structural problems are collected here instead of failing at the first
//! one, so a single planning run shows everything that needs fixing in the
//! task list. Every issue names the task IDs (or raw references) involved.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cycle::CycleReport;
use super::graph::DependencyGraph;
use super::inference::SuggestedDependency;
use super::registry::TaskRegistry;
use super::task::Category;

/// How an issue affects validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Kind of structural problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Tasks depend on each other in a loop (blocks planning)
    CycleDetected,
    /// A dependency references a task that is not in the run (edge dropped)
    DanglingDependency,
    /// Two tasks share an ID; the later one is ignored (blocks planning)
    DuplicateTaskId,
    /// Missing, negative or non-finite duration replaced by the fallback
    InvalidDuration,
    /// Non-setup task with neither dependencies nor dependents
    IsolatedTask,
    /// Keyword heuristics suggest an undeclared dependency
    InferredDependency,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::CycleDetected
            | IssueKind::DanglingDependency
            | IssueKind::DuplicateTaskId => Severity::Error,
            IssueKind::InvalidDuration
            | IssueKind::IsolatedTask
            | IssueKind::InferredDependency => Severity::Warning,
        }
    }

    /// Returns true if no plan may be emitted while this issue exists
    ///
    /// Dangling dependencies are errors too, but only their own edge is
    /// dropped and the rest of the plan is still produced.
    pub fn blocks_planning(&self) -> bool {
        matches!(self, IssueKind::CycleDetected | IssueKind::DuplicateTaskId)
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::CycleDetected => "cycle_detected",
            IssueKind::DanglingDependency => "dangling_dependency",
            IssueKind::DuplicateTaskId => "duplicate_task_id",
            IssueKind::InvalidDuration => "invalid_duration",
            IssueKind::IsolatedTask => "isolated_task",
            IssueKind::InferredDependency => "inferred_dependency",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single error or warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// Task IDs involved, in a meaningful order (a cycle path, or
    /// `[dependent, missing reference]`)
    pub affected_task_ids: Vec<String>,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        message: impl Into<String>,
        affected_task_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            affected_task_ids: affected_task_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Aggregated outcome of validating one task snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    /// Returns true if any error prevents a plan from being emitted
    pub fn blocks_planning(&self) -> bool {
        self.errors.iter().any(|e| e.kind.blocks_planning())
    }

    /// Returns all issues of a given kind (errors first)
    pub fn by_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |i| i.kind == kind)
    }
}

/// Collects issues and routes them by severity
#[derive(Debug, Default)]
pub struct ValidationReporter {
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl ValidationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        match issue.severity() {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Builds the full report for one planning run
///
/// Issue order is stable: registration issues, cycles, dangling
/// dependencies, isolated tasks, then suggestions.
pub fn validate(
    registry: &TaskRegistry,
    graph: &DependencyGraph,
    cycles: &CycleReport,
    suggestions: &[SuggestedDependency],
    warn_isolated: bool,
) -> ValidationResult {
    let mut reporter = ValidationReporter::new();

    reporter.extend(registry.issues().iter().cloned());

    for cycle in &cycles.cycles {
        let path = cycle
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        let message = if cycle.len() == 2 {
            format!("Task {} depends on itself", cycle[0])
        } else {
            format!("Dependency cycle: {}", path)
        };
        reporter.push(Issue::new(
            IssueKind::CycleDetected,
            message,
            cycle.iter().map(|id| id.to_string()),
        ));
    }

    for edge in graph.dangling_edges() {
        reporter.push(Issue::new(
            IssueKind::DanglingDependency,
            format!(
                "Task {} depends on '{}', which is not in the task set; the dependency was ignored",
                edge.dependent, edge.reference
            ),
            [edge.dependent.to_string(), edge.reference.clone()],
        ));
    }

    if warn_isolated {
        for node in graph.node_indices() {
            let task = graph.node(node);
            if task.category != Category::Setup
                && graph.prerequisite_indices(node).is_empty()
                && graph.dependent_indices(node).is_empty()
            {
                reporter.push(Issue::new(
                    IssueKind::IsolatedTask,
                    format!(
                        "Task {} ({}) has no dependencies and nothing depends on it",
                        task.id, task.category
                    ),
                    [task.id.to_string()],
                ));
            }
        }
    }

    for suggestion in suggestions {
        reporter.push(Issue::new(
            IssueKind::InferredDependency,
            format!(
                "Task {} may depend on {} ({}); not applied",
                suggestion.dependent, suggestion.prerequisite, suggestion.reason
            ),
            [
                suggestion.dependent.to_string(),
                suggestion.prerequisite.to_string(),
            ],
        ));
    }

    reporter.finish()
}

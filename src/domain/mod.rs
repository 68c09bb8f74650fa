//! Domain models and planning engine for taskplan
//!
//! Contains the core logic without any I/O concerns. Every analysis is a
//! synchronous, in-memory pass over a graph built fresh for one run.

mod id;
mod task;
mod registry;
mod graph;
mod cycle;
mod sort;
mod critical_path;
mod planner;
mod inference;
mod validation;
mod pipeline;

pub use id::{IdError, TaskId};
pub use task::{Category, Priority, Task};
pub use registry::{DependencyRef, RegisteredTask, TaskRegistry};
pub use graph::{DependencyEdge, DependencyGraph, PlanError, RawEdge, TaskNode};
pub use cycle::{detect_cycles, CycleReport};
pub use sort::{ordered_by, topological_indices, topological_order};
pub use critical_path::{analyze, analyze_in_order, CriticalPath, TaskTiming};
pub use planner::{build_plan, parallel_batches, ExecutionPlan, Strategy, StrategyParseError};
pub use inference::{suggest_dependencies, InferenceRule, SuggestedDependency, INFERRED_CONFIDENCE};
pub use validation::{
    validate, Issue, IssueKind, Severity, ValidationReporter, ValidationResult,
};
pub use pipeline::{plan, plan_registry, PlanOutcome, PlanningContext, DEFAULT_MIN_DURATION_HOURS};

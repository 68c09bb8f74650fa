//! Planning pipeline
//!
//! Registry → graph → cycle scan → (suggestions) → validation → plan.
//! All settings arrive through an explicit [`PlanningContext`]; nothing is
//! shared between runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cycle::detect_cycles;
use super::graph::{DependencyGraph, PlanError};
use super::inference::{suggest_dependencies, InferenceRule, SuggestedDependency};
use super::planner::{build_plan, ExecutionPlan, Strategy};
use super::registry::TaskRegistry;
use super::task::Task;
use super::validation::{validate, ValidationResult};

/// Default fallback for missing or invalid duration estimates
pub const DEFAULT_MIN_DURATION_HOURS: f64 = 1.0;

/// Settings for one planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    pub strategy: Strategy,
    /// Replaces missing, negative or non-finite estimates
    pub min_duration_hours: f64,
    /// Warn about non-setup tasks with no edges at all
    pub warn_isolated: bool,
    /// Keyword rules for the suggestion pass; `None` disables it
    pub suggestions: Option<Vec<InferenceRule>>,
}

impl Default for PlanningContext {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            min_duration_hours: DEFAULT_MIN_DURATION_HOURS,
            warn_isolated: true,
            suggestions: Some(InferenceRule::defaults()),
        }
    }
}

impl PlanningContext {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn without_suggestions(mut self) -> Self {
        self.suggestions = None;
        self
    }
}

/// Everything one planning run produces
#[derive(Debug)]
pub struct PlanOutcome {
    /// Always present, even when no plan could be built
    pub validation: ValidationResult,
    pub plan: Result<ExecutionPlan, PlanError>,
    pub suggestions: Vec<SuggestedDependency>,
}

impl PlanOutcome {
    pub fn is_planned(&self) -> bool {
        self.plan.is_ok()
    }
}

/// Runs the full pipeline over a task snapshot
///
/// The plan is refused when the report contains blocking errors (cycles,
/// duplicate IDs). Dangling dependencies are reported as errors but only
/// their own edge is dropped, so a plan is still produced.
pub fn plan(tasks: Vec<Task>, ctx: &PlanningContext) -> PlanOutcome {
    let registry = TaskRegistry::new(tasks, ctx.min_duration_hours);
    plan_registry(&registry, ctx)
}

/// Runs the pipeline over an existing registry snapshot
pub fn plan_registry(registry: &TaskRegistry, ctx: &PlanningContext) -> PlanOutcome {
    let graph = DependencyGraph::build(registry);
    let cycles = detect_cycles(&graph);

    let suggestions = match &ctx.suggestions {
        Some(rules) => suggest_dependencies(&graph, rules),
        None => Vec::new(),
    };

    let validation = validate(registry, &graph, &cycles, &suggestions, ctx.warn_isolated);
    debug!(
        valid = validation.is_valid,
        errors = validation.errors.len(),
        warnings = validation.warnings.len(),
        "validated task set"
    );

    let plan = if cycles.has_cycle {
        Err(PlanError::CycleDetected {
            cycles: cycles.cycles,
        })
    } else if validation.blocks_planning() {
        Err(PlanError::InvalidTaskSet {
            errors: validation
                .errors
                .iter()
                .filter(|e| e.kind.blocks_planning())
                .count(),
        })
    } else {
        build_plan(&graph, ctx.strategy)
    };

    if let Ok(plan) = &plan {
        info!(
            strategy = %plan.strategy,
            tasks = plan.len(),
            hours = plan.critical_path_duration_hours,
            "planned tasks"
        );
    }

    PlanOutcome {
        validation,
        plan,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::TaskId;
    use crate::domain::task::{Category, Priority};
    use crate::domain::validation::IssueKind;

    fn task(id: &str, hours: f64) -> Task {
        Task::new(id.parse().unwrap(), format!("Task {}", id)).with_duration(hours)
    }

    fn names(ids: &[TaskId]) -> Vec<&str> {
        ids.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn diamond_scenario() {
        let outcome = plan(
            vec![
                task("A", 2.0).with_category(Category::Setup),
                task("B", 3.0).depends_on("A"),
                task("C", 1.0).depends_on("A"),
                task("D", 4.0).depends_on("B").depends_on("C"),
            ],
            &PlanningContext::default().with_strategy(Strategy::Parallelizable),
        );

        assert!(outcome.validation.is_valid);
        let plan = outcome.plan.unwrap();
        assert_eq!(names(&plan.critical_path), vec!["A", "B", "D"]);
        assert_eq!(plan.critical_path_duration_hours, 9.0);
        let batches: Vec<_> = plan.batches.iter().map(|b| names(b)).collect();
        assert_eq!(batches, vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    }

    #[test]
    fn mutual_dependency_scenario() {
        let outcome = plan(
            vec![task("X", 1.0).depends_on("Y"), task("Y", 1.0).depends_on("X")],
            &PlanningContext::default(),
        );

        assert!(!outcome.validation.is_valid);
        match outcome.plan {
            Err(PlanError::CycleDetected { cycles }) => {
                assert_eq!(names(&cycles[0]), vec!["X", "Y", "X"]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn dangling_dependency_scenario() {
        let outcome = plan(
            vec![
                task("A", 1.0).with_category(Category::Setup),
                task("Z", 1.0).depends_on("missing-1"),
                task("B", 1.0).depends_on("Z").depends_on("A"),
            ],
            &PlanningContext::default(),
        );

        assert!(!outcome.validation.is_valid);
        let error = outcome
            .validation
            .by_kind(IssueKind::DanglingDependency)
            .next()
            .unwrap();
        assert_eq!(error.affected_task_ids, vec!["Z", "missing-1"]);

        let plan = outcome.plan.unwrap();
        assert_eq!(names(&plan.order), vec!["A", "Z", "B"]);
    }

    #[test]
    fn independent_tasks_scenario() {
        let tasks = vec![
            task("t1", 1.0).with_priority(Priority::Low),
            task("t2", 1.0).with_priority(Priority::High),
            task("t3", 1.0),
            task("t4", 1.0).with_priority(Priority::High),
            task("t5", 1.0),
        ];

        let sequential = plan(tasks.clone(), &PlanningContext::default()).plan.unwrap();
        assert_eq!(names(&sequential.order), vec!["t2", "t4", "t3", "t5", "t1"]);

        let parallel = plan(
            tasks,
            &PlanningContext::default().with_strategy(Strategy::Parallelizable),
        )
        .plan
        .unwrap();
        assert_eq!(parallel.batches.len(), 1);
        assert_eq!(parallel.batches[0].len(), 5);
    }

    #[test]
    fn duplicate_ids_block_planning() {
        let outcome = plan(
            vec![task("A", 1.0), task("A", 2.0)],
            &PlanningContext::default(),
        );

        assert!(!outcome.validation.is_valid);
        assert_eq!(outcome.plan, Err(PlanError::InvalidTaskSet { errors: 1 }));
    }

    #[test]
    fn suggestions_are_warnings_not_edges() {
        let tasks = vec![
            Task::new("db".parse().unwrap(), "Set up database")
                .with_duration(1.0)
                .with_category(Category::Setup),
            Task::new("api".parse().unwrap(), "Build API").with_duration(1.0),
        ];

        let outcome = plan(tasks.clone(), &PlanningContext::default());
        assert!(outcome.validation.is_valid);
        assert_eq!(outcome.suggestions.len(), 1);
        assert_eq!(
            outcome
                .validation
                .by_kind(IssueKind::InferredDependency)
                .count(),
            1
        );
        // The suggested edge is not applied: api is still in the first batch
        let plan = outcome.plan.unwrap();
        assert_eq!(plan.batches.len(), 1);

        let quiet = plan_registry(
            &TaskRegistry::new(tasks, 1.0),
            &PlanningContext::default().without_suggestions(),
        );
        assert!(quiet.suggestions.is_empty());
    }

    #[test]
    fn replanning_uses_fresh_snapshot() {
        let ctx = PlanningContext::default();
        let registry = TaskRegistry::new(vec![task("A", 1.0), task("B", 2.0).depends_on("A")], 1.0);
        let before = plan_registry(&registry, &ctx).plan.unwrap();

        let next = registry.with_task(task("C", 5.0).depends_on("B"));
        let after = plan_registry(&next, &ctx).plan.unwrap();

        assert_eq!(before.critical_path_duration_hours, 3.0);
        assert_eq!(after.critical_path_duration_hours, 8.0);
        assert_eq!(names(&after.critical_path), vec!["A", "B", "C"]);
    }
}

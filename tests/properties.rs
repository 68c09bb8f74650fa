//! Property tests over randomly generated task sets
//!
//! Acyclic inputs are built by only letting a task depend on tasks listed
//! before it; cyclic inputs add a back edge on top of that.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use taskplan::domain::{
    detect_cycles, plan, DependencyGraph, PlanError, PlanningContext, Priority,
    Strategy as PlanStrategy, Task, TaskId, TaskRegistry,
};

#[derive(Debug, Clone)]
struct Spec {
    durations: Vec<f64>,
    priorities: Vec<u8>,
    edges: Vec<(usize, usize)>,
}

fn id(i: usize) -> String {
    format!("t{}", i)
}

fn arb_dag() -> impl Strategy<Value = Spec> {
    (1usize..25).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..10.0, n),
            prop::collection::vec(0u8..3, n),
            prop::collection::vec((0..n, 0..n), 0..n * 2),
        )
            .prop_map(|(durations, priorities, pairs)| {
                // dependent is always the later task
                let edges = pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| if a > b { (a, b) } else { (b, a) })
                    .collect();
                Spec {
                    durations,
                    priorities,
                    edges,
                }
            })
    })
}

fn tasks(spec: &Spec) -> Vec<Task> {
    let mut tasks: Vec<Task> = (0..spec.durations.len())
        .map(|i| {
            let priority = match spec.priorities[i] {
                0 => Priority::Low,
                1 => Priority::Medium,
                _ => Priority::High,
            };
            Task::new(id(i).parse().unwrap(), format!("Task {}", i))
                .with_duration(spec.durations[i])
                .with_priority(priority)
        })
        .collect();

    for &(dependent, prerequisite) in &spec.edges {
        tasks[dependent].add_dependency(id(prerequisite));
    }
    tasks
}

fn context(strategy: PlanStrategy) -> PlanningContext {
    PlanningContext::default()
        .with_strategy(strategy)
        .without_suggestions()
}

fn prerequisites(spec: &Spec) -> HashMap<String, HashSet<String>> {
    let mut map: HashMap<String, HashSet<String>> = HashMap::new();
    for &(dependent, prerequisite) in &spec.edges {
        map.entry(id(dependent)).or_default().insert(id(prerequisite));
    }
    map
}

proptest! {
    #[test]
    fn every_strategy_respects_dependencies(spec in arb_dag()) {
        let prereqs = prerequisites(&spec);

        for strategy in PlanStrategy::all() {
            let outcome = plan(tasks(&spec), &context(strategy));
            let plan = outcome.plan.unwrap();

            prop_assert_eq!(plan.order.len(), spec.durations.len());
            let position: HashMap<&str, usize> = plan
                .order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            prop_assert_eq!(position.len(), spec.durations.len());

            for (dependent, required) in &prereqs {
                for prerequisite in required {
                    prop_assert!(position[prerequisite.as_str()] < position[dependent.as_str()]);
                }
            }
        }
    }

    #[test]
    fn planning_is_deterministic(spec in arb_dag()) {
        for strategy in PlanStrategy::all() {
            let first = plan(tasks(&spec), &context(strategy)).plan.unwrap();
            let second = plan(tasks(&spec), &context(strategy)).plan.unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn critical_path_is_a_longest_chain(spec in arb_dag()) {
        let registry = TaskRegistry::new(tasks(&spec), 1.0);
        let graph = DependencyGraph::build(&registry);
        let plan = plan(tasks(&spec), &context(PlanStrategy::Sequential)).plan.unwrap();

        let total: f64 = spec.durations.iter().sum();
        let longest_task = spec.durations.iter().cloned().fold(0.0, f64::max);
        prop_assert!(plan.critical_path_duration_hours + 1e-9 >= longest_task);
        prop_assert!(plan.critical_path_duration_hours <= total + 1e-9);
        prop_assert!((plan.total_duration_hours - total).abs() < 1e-6);

        let path_sum: f64 = plan
            .critical_path
            .iter()
            .map(|task| {
                let i: usize = task.as_str()[1..].parse().unwrap();
                spec.durations[i]
            })
            .sum();
        prop_assert!((path_sum - plan.critical_path_duration_hours).abs() < 1e-6);

        for pair in plan.critical_path.windows(2) {
            prop_assert!(graph.prerequisites(&pair[1]).contains(&pair[0]));
        }

        let timings: HashMap<&TaskId, _> = plan.timings.iter().map(|t| (&t.id, t)).collect();
        for task in &plan.critical_path {
            prop_assert!(timings[task].is_critical());
        }
        for timing in &plan.timings {
            prop_assert!(timing.slack >= 0.0);
        }
    }

    #[test]
    fn critical_path_strategy_runs_the_path_first(spec in arb_dag()) {
        let prereqs = prerequisites(&spec);
        let plan = plan(tasks(&spec), &context(PlanStrategy::CriticalPath)).plan.unwrap();
        let position: HashMap<&str, usize> = plan
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        // the path plus every task it transitively needs
        let mut needed: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = plan.critical_path.iter().map(|t| t.to_string()).collect();
        while let Some(task) = stack.pop() {
            if let Some(required) = prereqs.get(&task) {
                stack.extend(required.iter().filter(|p| !needed.contains(*p)).cloned());
            }
            needed.insert(task);
        }

        let path_positions: Vec<usize> = plan
            .critical_path
            .iter()
            .map(|t| position[t.as_str()])
            .collect();
        prop_assert!(path_positions.windows(2).all(|w| w[0] < w[1]));

        let last_needed = needed.iter().map(|t| position[t.as_str()]).max().unwrap();
        for task in &plan.order {
            if !needed.contains(task.as_str()) {
                prop_assert!(
                    position[task.as_str()] > last_needed,
                    "{} is not needed by the path but runs before it",
                    task
                );
            }
        }
    }

    #[test]
    fn batches_partition_tasks_by_depth(spec in arb_dag()) {
        let prereqs = prerequisites(&spec);
        let plan = plan(tasks(&spec), &context(PlanStrategy::Parallelizable)).plan.unwrap();

        let mut batch_of: HashMap<String, usize> = HashMap::new();
        for (i, batch) in plan.batches.iter().enumerate() {
            prop_assert!(!batch.is_empty());
            for task in batch {
                prop_assert!(batch_of.insert(task.to_string(), i).is_none());
            }
        }
        prop_assert_eq!(batch_of.len(), spec.durations.len());

        for (dependent, required) in &prereqs {
            for prerequisite in required {
                prop_assert!(batch_of[prerequisite] < batch_of[dependent]);
            }
        }

        let flattened: Vec<&TaskId> = plan.batches.iter().flatten().collect();
        let order: Vec<&TaskId> = plan.order.iter().collect();
        prop_assert_eq!(flattened, order);
    }

    #[test]
    fn cycles_are_closed_paths_over_real_edges(spec in arb_dag()) {
        let n = spec.durations.len();
        let mut tasks = tasks(&spec);
        // close a loop: the first task now waits on the last one
        tasks[0].add_dependency(id(n - 1));
        if n > 1 {
            tasks[n - 1].add_dependency(id(0));
        }

        let registry = TaskRegistry::new(tasks.clone(), 1.0);
        let graph = DependencyGraph::build(&registry);
        let report = detect_cycles(&graph);

        prop_assert!(report.has_cycle);
        for cycle in &report.cycles {
            prop_assert!(cycle.len() >= 2);
            prop_assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                prop_assert!(graph.prerequisites(&pair[0]).contains(&pair[1]));
            }
        }

        let outcome = plan(tasks, &context(PlanStrategy::Sequential));
        prop_assert!(!outcome.validation.is_valid);
        let refused_with_cycles =
            matches!(outcome.plan, Err(PlanError::CycleDetected { ref cycles }) if !cycles.is_empty());
        prop_assert!(refused_with_cycles);
    }
}

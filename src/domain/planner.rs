//! Execution planning
//!
//! One planner, three ordering strategies:
//!
//! | Strategy | Order |
//! |----------|-------|
//! | `sequential` | Topological order with the priority / input-order tie-break |
//! | `critical_path` | Critical-path tasks in path order (each after the ancestors it needs), then the rest by priority |
//! | `parallelizable` | Batches concatenated; batch = 1 + deepest prerequisite batch |
//!
//! Every strategy yields a legal topological order: no task is placed
//! before any of its prerequisites.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::critical_path::{analyze_in_order, TaskTiming};
use super::graph::{DependencyGraph, PlanError};
use super::id::TaskId;
use super::sort::{ordered_by, topological_indices};

#[derive(Debug, Error, PartialEq)]
#[error("Unknown strategy '{0}': expected sequential, critical_path or parallelizable")]
pub struct StrategyParseError(String);

/// How the final execution order is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Sequential,
    CriticalPath,
    Parallelizable,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::CriticalPath => "critical_path",
            Strategy::Parallelizable => "parallelizable",
        }
    }

    pub fn all() -> [Strategy; 3] {
        [
            Strategy::Sequential,
            Strategy::CriticalPath,
            Strategy::Parallelizable,
        ]
    }

    /// Produces this strategy's order from the shared analyses
    fn order(&self, graph: &DependencyGraph, analysis: &Analysis) -> Result<Vec<NodeIndex>, PlanError> {
        match self {
            Strategy::Sequential => Ok(analysis.topological.clone()),
            Strategy::CriticalPath => {
                let prefix = critical_prefix(graph, analysis);
                let mut prefix_position = vec![None; graph.node_count()];
                for (pos, idx) in prefix.iter().enumerate() {
                    prefix_position[idx.index()] = Some(Reverse(pos));
                }
                // The prefix is closed under prerequisites, so it is replayed
                // verbatim before anything else becomes eligible.
                ordered_by(graph, |idx| (prefix_position[idx.index()], graph.rank(idx)))
            }
            Strategy::Parallelizable => Ok(analysis.batches.iter().flatten().copied().collect()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "critical_path" => Ok(Strategy::CriticalPath),
            "parallelizable" | "parallel" => Ok(Strategy::Parallelizable),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

/// Critical-path tasks in path order, each preceded by the ancestors it
/// still needs (in topological order)
fn critical_prefix(graph: &DependencyGraph, analysis: &Analysis) -> Vec<NodeIndex> {
    let n = graph.node_count();
    let mut placed = vec![false; n];
    let mut prefix = Vec::new();

    for &task in &analysis.critical_path {
        let mut needed = vec![false; n];
        let mut stack = graph.prerequisite_indices(task);
        while let Some(idx) = stack.pop() {
            // placed tasks already have all their ancestors placed
            if placed[idx.index()] || needed[idx.index()] {
                continue;
            }
            needed[idx.index()] = true;
            stack.extend(graph.prerequisite_indices(idx));
        }

        for &idx in &analysis.topological {
            if needed[idx.index()] {
                placed[idx.index()] = true;
                prefix.push(idx);
            }
        }
        if !placed[task.index()] {
            placed[task.index()] = true;
            prefix.push(task);
        }
    }
    prefix
}

/// Analyses shared by all strategies
struct Analysis {
    topological: Vec<NodeIndex>,
    critical_path: Vec<NodeIndex>,
    batches: Vec<Vec<NodeIndex>>,
}

/// Final plan handed to orchestration and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub strategy: Strategy,
    /// Execution sequence for the chosen strategy
    pub order: Vec<TaskId>,
    pub critical_path: Vec<TaskId>,
    pub critical_path_duration_hours: f64,
    /// Sum of all task durations (fully sequential effort)
    pub total_duration_hours: f64,
    /// Tasks within a batch may run concurrently once earlier batches finish
    pub batches: Vec<Vec<TaskId>>,
    /// Schedule bounds per task, in topological order
    pub timings: Vec<TaskTiming>,
}

impl ExecutionPlan {
    /// Returns the batch a task belongs to
    pub fn batch_index(&self, id: &TaskId) -> Option<usize> {
        self.batches.iter().position(|batch| batch.contains(id))
    }

    /// Returns the index and outstanding tasks of the first unfinished batch
    ///
    /// Tasks of batch `k + 1` are never returned while any task of batch `k`
    /// is outstanding. `None` once every batch is complete.
    pub fn next_batch(&self, completed: &HashSet<TaskId>) -> Option<(usize, Vec<TaskId>)> {
        self.batches.iter().enumerate().find_map(|(i, batch)| {
            let pending: Vec<TaskId> = batch
                .iter()
                .filter(|id| !completed.contains(*id))
                .cloned()
                .collect();
            (!pending.is_empty()).then_some((i, pending))
        })
    }

    /// Returns the position of a task in the execution order
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.order.iter().position(|t| t == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Assigns batch levels: 0 without prerequisites, else 1 + deepest prerequisite
///
/// Within a batch, tasks are ordered by rank (priority, then input order).
pub fn parallel_batches(graph: &DependencyGraph, topological: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
    let mut level = vec![0usize; graph.node_count()];
    let mut batches: Vec<Vec<NodeIndex>> = Vec::new();

    for &idx in topological {
        let l = graph
            .prerequisite_indices(idx)
            .into_iter()
            .map(|p| level[p.index()] + 1)
            .max()
            .unwrap_or(0);
        level[idx.index()] = l;
        if batches.len() <= l {
            batches.resize_with(l + 1, Vec::new);
        }
        batches[l].push(idx);
    }

    for batch in &mut batches {
        batch.sort_by_key(|&idx| Reverse(graph.rank(idx)));
    }
    batches
}

/// Builds the execution plan for a graph
///
/// Fails with `CycleDetected` instead of producing a partial plan.
pub fn build_plan(graph: &DependencyGraph, strategy: Strategy) -> Result<ExecutionPlan, PlanError> {
    let topological = topological_indices(graph)?;
    let critical = analyze_in_order(graph, &topological);
    let critical_indices: Vec<NodeIndex> = critical
        .path
        .iter()
        .filter_map(|id| graph.index_of(id))
        .collect();
    let batches = parallel_batches(graph, &topological);

    let analysis = Analysis {
        topological,
        critical_path: critical_indices,
        batches,
    };
    let order = strategy.order(graph, &analysis)?;

    let ids = |indices: &[NodeIndex]| -> Vec<TaskId> {
        indices.iter().map(|&i| graph.task_id(i).clone()).collect()
    };

    let total_duration_hours: f64 = graph
        .node_indices()
        .map(|idx| graph.node(idx).duration_hours)
        .sum();

    debug!(
        strategy = %strategy,
        tasks = order.len(),
        batches = analysis.batches.len(),
        "built execution plan"
    );

    Ok(ExecutionPlan {
        strategy,
        order: ids(&order),
        critical_path: critical.path,
        critical_path_duration_hours: critical.duration_hours,
        total_duration_hours,
        batches: analysis.batches.iter().map(|b| ids(b)).collect(),
        timings: critical.timings,
    })
}

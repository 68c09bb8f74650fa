//! Critical path analysis
//!
//! Forward pass over the topological order computes each task's earliest
//! finish; predecessor pointers are kept so the longest duration-weighted
//! chain can be walked back. A backward pass from the project finish then
//! gives latest start/finish and slack for every task.
//!
//! Ties between equally long chains are broken with the sorter's rank
//! (higher priority, then earlier input position) so results are
//! reproducible.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph::{DependencyGraph, PlanError};
use super::id::TaskId;
use super::sort::topological_indices;

/// Slack below this is reported as zero (float noise from the two passes)
const SLACK_EPSILON: f64 = 1e-9;

/// Schedule bounds for one task, in hours from project start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub id: TaskId,
    pub duration_hours: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.slack == 0.0
    }
}

/// Longest duration-weighted path and per-task schedule bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Path from first prerequisite to last dependent
    pub path: Vec<TaskId>,
    pub duration_hours: f64,
    /// Timings in topological order
    pub timings: Vec<TaskTiming>,
}

impl CriticalPath {
    pub fn timing(&self, id: &TaskId) -> Option<&TaskTiming> {
        self.timings.iter().find(|t| &t.id == id)
    }
}

/// Computes the critical path; fails on cyclic graphs
pub fn analyze(graph: &DependencyGraph) -> Result<CriticalPath, PlanError> {
    let order = topological_indices(graph)?;
    Ok(analyze_in_order(graph, &order))
}

/// Computes the critical path for a precomputed topological order
pub fn analyze_in_order(graph: &DependencyGraph, order: &[NodeIndex]) -> CriticalPath {
    let n = graph.node_count();
    if n == 0 {
        return CriticalPath::default();
    }

    let duration = |idx: NodeIndex| graph.node(idx).duration_hours;

    // Forward pass
    let mut earliest_finish = vec![0.0_f64; n];
    let mut predecessor: Vec<Option<NodeIndex>> = vec![None; n];
    let mut end: Option<NodeIndex> = None;

    for &idx in order {
        let mut best: Option<NodeIndex> = None;
        for prerequisite in graph.prerequisite_indices(idx) {
            best = match best {
                None => Some(prerequisite),
                Some(current) => Some(pick(graph, &earliest_finish, current, prerequisite)),
            };
        }

        let start = best.map(|p| earliest_finish[p.index()]).unwrap_or(0.0);
        earliest_finish[idx.index()] = start + duration(idx);
        predecessor[idx.index()] = best;

        end = match end {
            None => Some(idx),
            Some(current) => Some(pick(graph, &earliest_finish, current, idx)),
        };
    }

    let mut path = Vec::new();
    let mut cursor = end;
    while let Some(idx) = cursor {
        path.push(graph.task_id(idx).clone());
        cursor = predecessor[idx.index()];
    }
    path.reverse();

    let project_finish = end.map(|e| earliest_finish[e.index()]).unwrap_or(0.0);

    // Backward pass
    let mut latest_finish = vec![project_finish; n];
    for &idx in order.iter().rev() {
        let bound = graph
            .dependent_indices(idx)
            .into_iter()
            .map(|d| latest_finish[d.index()] - duration(d))
            .fold(project_finish, f64::min);
        latest_finish[idx.index()] = bound;
    }

    let timings = order
        .iter()
        .map(|&idx| {
            let d = duration(idx);
            let ef = earliest_finish[idx.index()];
            let lf = latest_finish[idx.index()];
            let mut slack = lf - ef;
            if slack.abs() < SLACK_EPSILON {
                slack = 0.0;
            }
            TaskTiming {
                id: graph.task_id(idx).clone(),
                duration_hours: d,
                earliest_start: ef - d,
                earliest_finish: ef,
                latest_start: lf - d,
                latest_finish: lf,
                slack,
            }
        })
        .collect();

    debug!(
        length = path.len(),
        hours = project_finish,
        "computed critical path"
    );

    CriticalPath {
        path,
        duration_hours: project_finish,
        timings,
    }
}

/// Picks the node with the larger earliest finish, falling back to rank
fn pick(graph: &DependencyGraph, finish: &[f64], a: NodeIndex, b: NodeIndex) -> NodeIndex {
    let (fa, fb) = (finish[a.index()], finish[b.index()]);
    if fb > fa || (fb == fa && graph.rank(b) > graph.rank(a)) {
        b
    } else {
        a
    }
}

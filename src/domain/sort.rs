//! Topological ordering
//!
//! Kahn's algorithm over the dependency graph. A task's in-degree is its
//! number of unfinished prerequisites. Among tasks that are eligible at the
//! same time, the one with the highest rank is emitted first; the default
//! rank is higher priority, then earlier input position.

use petgraph::graph::NodeIndex;
use std::collections::BinaryHeap;
use tracing::debug;

use super::cycle::detect_cycles;
use super::graph::{DependencyGraph, PlanError};
use super::id::TaskId;

/// Returns all tasks in topological order (prerequisites before dependents)
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<TaskId>, PlanError> {
    let order = topological_indices(graph)?;
    Ok(order
        .into_iter()
        .map(|idx| graph.task_id(idx).clone())
        .collect())
}

/// Topological order using the default priority / input-order tie-break
pub fn topological_indices(graph: &DependencyGraph) -> Result<Vec<NodeIndex>, PlanError> {
    ordered_by(graph, |idx| graph.rank(idx))
}

/// Kahn's algorithm with a caller-supplied rank; larger ranks go first
///
/// Refuses to return a partial order: if some tasks never become eligible
/// the graph has a cycle, which is reported in full.
pub fn ordered_by<K, F>(graph: &DependencyGraph, rank: F) -> Result<Vec<NodeIndex>, PlanError>
where
    K: Ord,
    F: Fn(NodeIndex) -> K,
{
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.prerequisite_indices(idx).len())
        .collect();

    let mut eligible: BinaryHeap<(K, NodeIndex)> = graph
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .map(|idx| (rank(idx), idx))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some((_, idx)) = eligible.pop() {
        order.push(idx);
        for dependent in graph.dependent_indices(idx) {
            let remaining = &mut in_degree[dependent.index()];
            *remaining -= 1;
            if *remaining == 0 {
                eligible.push((rank(dependent), dependent));
            }
        }
    }

    if order.len() != graph.node_count() {
        let report = detect_cycles(graph);
        debug!(
            emitted = order.len(),
            nodes = graph.node_count(),
            "topological sort stalled"
        );
        return Err(PlanError::CycleDetected {
            cycles: report.cycles,
        });
    }

    Ok(order)
}

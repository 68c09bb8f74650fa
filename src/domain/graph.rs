//! Dependency graph for tasks
//!
//! Built fresh from a [`TaskRegistry`] snapshot and never mutated afterwards.
//! Uses petgraph for storage and reachability queries.
//!
//! Edge direction is fixed: an edge goes from the dependent task to the
//! prerequisite it requires (`dependent -> prerequisite`). Outgoing
//! neighbours are prerequisites, incoming neighbours are dependents.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::id::TaskId;
use super::registry::{DependencyRef, TaskRegistry};
use super::task::{Category, Priority};

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Dependency cycle detected: {}", format_cycles(.cycles))]
    CycleDetected { cycles: Vec<Vec<TaskId>> },

    #[error("Task set has {errors} blocking validation error(s)")]
    InvalidTaskSet { errors: usize },
}

fn format_cycles(cycles: &[Vec<TaskId>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            cycle
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A resolved `(dependent, prerequisite)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub dependent: TaskId,
    pub prerequisite: TaskId,
}

/// A dependency as declared, before dropping unresolved references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub dependent: TaskId,
    pub reference: String,
    /// Set when the reference matched a task
    pub prerequisite: Option<TaskId>,
}

impl RawEdge {
    pub fn is_resolved(&self) -> bool {
        self.prerequisite.is_some()
    }
}

/// Node payload: what the analyses need to know about a task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub id: TaskId,
    pub title: String,
    pub duration_hours: f64,
    pub priority: Priority,
    pub category: Category,
}

/// A dependency graph for one planning run
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph; node index == registry position
    graph: DiGraph<TaskNode, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,

    /// Every declared dependency, resolved or not, in declaration order
    raw_edges: Vec<RawEdge>,
}

impl DependencyGraph {
    /// Builds a graph from a registry snapshot
    ///
    /// Unresolved references are kept in the raw edge list and reported
    /// through [`dangling_edges`](Self::dangling_edges); they never become
    /// graph edges.
    pub fn build(registry: &TaskRegistry) -> Self {
        let mut graph = DiGraph::with_capacity(registry.len(), registry.len());
        let mut node_map = HashMap::with_capacity(registry.len());

        // First pass: add all nodes (input order)
        for task in registry.tasks() {
            let idx = graph.add_node(TaskNode {
                id: task.id.clone(),
                title: task.title.clone(),
                duration_hours: task.duration_hours,
                priority: task.priority,
                category: task.category,
            });
            node_map.insert(task.id.clone(), idx);
        }

        // Second pass: add all edges
        let mut raw_edges = Vec::new();
        for task in registry.tasks() {
            let from = node_map[&task.id];
            for dep in &task.dependencies {
                match dep {
                    DependencyRef::Resolved(prerequisite) => {
                        let to = node_map[prerequisite];
                        graph.add_edge(from, to, ());
                        raw_edges.push(RawEdge {
                            dependent: task.id.clone(),
                            reference: prerequisite.to_string(),
                            prerequisite: Some(prerequisite.clone()),
                        });
                    }
                    DependencyRef::Unresolved(reference) => {
                        warn!(task = %task.id, reference = %reference, "dropping dangling dependency");
                        raw_edges.push(RawEdge {
                            dependent: task.id.clone(),
                            reference: reference.clone(),
                            prerequisite: None,
                        });
                    }
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );

        Self {
            graph,
            node_map,
            raw_edges,
        }
    }

    /// Node indices in input order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn node(&self, idx: NodeIndex) -> &TaskNode {
        &self.graph[idx]
    }

    pub fn index_of(&self, task_id: &TaskId) -> Option<NodeIndex> {
        self.node_map.get(task_id).copied()
    }

    pub fn task_id(&self, idx: NodeIndex) -> &TaskId {
        &self.graph[idx].id
    }

    /// Tie-break key shared by every ordering pass: higher priority
    /// first, then input order. Larger keys win.
    pub fn rank(&self, idx: NodeIndex) -> (Priority, Reverse<usize>) {
        (self.graph[idx].priority, Reverse(idx.index()))
    }

    /// Direct prerequisites, in input order
    pub fn prerequisite_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(idx, Direction::Outgoing)
    }

    /// Direct dependents, in input order
    pub fn dependent_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_sorted(idx, Direction::Incoming)
    }

    fn neighbors_sorted(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<_> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Returns the direct prerequisites of a task
    pub fn prerequisites(&self, task_id: &TaskId) -> Vec<TaskId> {
        match self.index_of(task_id) {
            Some(idx) => self.ids(self.prerequisite_indices(idx)),
            None => vec![],
        }
    }

    /// Returns the direct dependents of a task (tasks that require it)
    pub fn dependents(&self, task_id: &TaskId) -> Vec<TaskId> {
        match self.index_of(task_id) {
            Some(idx) => self.ids(self.dependent_indices(idx)),
            None => vec![],
        }
    }

    fn ids(&self, indices: Vec<NodeIndex>) -> Vec<TaskId> {
        indices
            .into_iter()
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Forward adjacency: dependent -> prerequisites, in input order
    pub fn adjacency(&self) -> Vec<(TaskId, Vec<TaskId>)> {
        self.node_indices()
            .map(|idx| (self.task_id(idx).clone(), self.ids(self.prerequisite_indices(idx))))
            .collect()
    }

    /// Reverse adjacency: prerequisite -> dependents, in input order
    pub fn reverse_adjacency(&self) -> Vec<(TaskId, Vec<TaskId>)> {
        self.node_indices()
            .map(|idx| (self.task_id(idx).clone(), self.ids(self.dependent_indices(idx))))
            .collect()
    }

    /// Resolved edges in declaration order
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.raw_edges
            .iter()
            .filter_map(|e| {
                e.prerequisite.as_ref().map(|prerequisite| DependencyEdge {
                    dependent: e.dependent.clone(),
                    prerequisite: prerequisite.clone(),
                })
            })
            .collect()
    }

    /// Every declared dependency, including unresolved ones
    pub fn raw_edges(&self) -> &[RawEdge] {
        &self.raw_edges
    }

    /// Declared dependencies that matched no task
    pub fn dangling_edges(&self) -> impl Iterator<Item = &RawEdge> {
        self.raw_edges.iter().filter(|e| !e.is_resolved())
    }

    /// Returns true if `dependent` already (transitively) requires `prerequisite`
    pub fn requires(&self, dependent: NodeIndex, prerequisite: NodeIndex) -> bool {
        has_path_connecting(&self.graph, dependent, prerequisite, None)
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

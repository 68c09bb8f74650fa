//! Cycle detection
//!
//! Depth-first traversal with three states per node. Traversal follows
//! edges from dependent to prerequisite; when it reaches a node that is
//! still on the stack, the stack slice from that node to the top is the
//! cycle. The scan continues over every unvisited node, so all cycles
//! reachable as back edges are reported in one pass.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph::DependencyGraph;
use super::id::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Result of a cycle scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub has_cycle: bool,
    /// Closed paths: the first ID equals the last
    pub cycles: Vec<Vec<TaskId>>,
}

/// One frame of the explicit DFS stack
struct Frame {
    node: NodeIndex,
    prerequisites: Vec<NodeIndex>,
    next: usize,
}

/// Scans the whole graph for cycles
pub fn detect_cycles(graph: &DependencyGraph) -> CycleReport {
    let mut state = vec![VisitState::Unvisited; graph.node_count()];
    let mut cycles = Vec::new();

    for start in graph.node_indices() {
        if state[start.index()] != VisitState::Unvisited {
            continue;
        }

        state[start.index()] = VisitState::OnStack;
        let mut stack = vec![Frame {
            node: start,
            prerequisites: graph.prerequisite_indices(start),
            next: 0,
        }];

        loop {
            let step = match stack.last_mut() {
                None => break,
                Some(frame) if frame.next < frame.prerequisites.len() => {
                    frame.next += 1;
                    Some(frame.prerequisites[frame.next - 1])
                }
                Some(frame) => {
                    state[frame.node.index()] = VisitState::Done;
                    None
                }
            };

            let Some(next) = step else {
                stack.pop();
                continue;
            };

            match state[next.index()] {
                VisitState::Unvisited => {
                    state[next.index()] = VisitState::OnStack;
                    stack.push(Frame {
                        node: next,
                        prerequisites: graph.prerequisite_indices(next),
                        next: 0,
                    });
                }
                VisitState::OnStack => {
                    if let Some(pos) = stack.iter().position(|f| f.node == next) {
                        let mut path: Vec<TaskId> = stack[pos..]
                            .iter()
                            .map(|f| graph.task_id(f.node).clone())
                            .collect();
                        path.push(graph.task_id(next).clone());
                        debug!(cycle = ?path, "found dependency cycle");
                        cycles.push(path);
                    }
                }
                VisitState::Done => {}
            }
        }
    }

    CycleReport {
        has_cycle: !cycles.is_empty(),
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::TaskRegistry;
    use crate::domain::task::Task;

    fn task(id: &str) -> Task {
        Task::new(id.parse().unwrap(), format!("Task {}", id)).with_duration(1.0)
    }

    fn scan(tasks: Vec<Task>) -> CycleReport {
        let graph = DependencyGraph::build(&TaskRegistry::new(tasks, 1.0));
        detect_cycles(&graph)
    }

    fn ids(path: &[TaskId]) -> Vec<&str> {
        path.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn acyclic_graph() {
        let report = scan(vec![
            task("A"),
            task("B").depends_on("A"),
            task("C").depends_on("A"),
            task("D").depends_on("B").depends_on("C"),
        ]);
        assert!(!report.has_cycle);
        assert!(report.cycles.is_empty());
    }

    #[test]
    fn two_node_cycle() {
        let report = scan(vec![task("X").depends_on("Y"), task("Y").depends_on("X")]);

        assert!(report.has_cycle);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(ids(&report.cycles[0]), vec!["X", "Y", "X"]);
    }

    #[test]
    fn self_dependency_is_one_node_cycle() {
        let report = scan(vec![task("A"), task("B").depends_on("B")]);

        assert!(report.has_cycle);
        assert_eq!(ids(&report.cycles[0]), vec!["B", "B"]);
    }

    #[test]
    fn reports_every_disjoint_cycle() {
        let report = scan(vec![
            task("A").depends_on("B"),
            task("B").depends_on("A"),
            task("C"),
            task("D").depends_on("E"),
            task("E").depends_on("F"),
            task("F").depends_on("D"),
            task("G").depends_on("G"),
        ]);

        assert_eq!(report.cycles.len(), 3);
        assert_eq!(ids(&report.cycles[0]), vec!["A", "B", "A"]);
        assert_eq!(ids(&report.cycles[1]), vec!["D", "E", "F", "D"]);
        assert_eq!(ids(&report.cycles[2]), vec!["G", "G"]);
    }

    #[test]
    fn cycle_reached_through_tail() {
        // A -> B -> C -> B: the cycle excludes A
        let report = scan(vec![
            task("A").depends_on("B"),
            task("B").depends_on("C"),
            task("C").depends_on("B"),
        ]);

        assert_eq!(report.cycles.len(), 1);
        assert_eq!(ids(&report.cycles[0]), vec!["B", "C", "B"]);
    }

    #[test]
    fn cycle_paths_use_existing_edges() {
        let tasks = vec![
            task("A").depends_on("C"),
            task("B").depends_on("A"),
            task("C").depends_on("B"),
            task("D").depends_on("C"),
        ];
        let graph = DependencyGraph::build(&TaskRegistry::new(tasks, 1.0));
        let report = detect_cycles(&graph);

        assert!(report.has_cycle);
        for cycle in &report.cycles {
            assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                assert!(graph.prerequisites(&pair[0]).contains(&pair[1]));
            }
        }
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        // Shared prerequisite visited twice must not look like a cycle
        let report = scan(vec![
            task("D").depends_on("B").depends_on("C"),
            task("B").depends_on("A"),
            task("C").depends_on("A"),
            task("A"),
        ]);
        assert!(!report.has_cycle);
    }
}

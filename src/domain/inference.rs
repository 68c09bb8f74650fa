//! Dependency suggestions from task titles
//!
//! A separate, low-confidence pass: when a task title mentions a rule's
//! keyword, every other task whose title mentions the rule's `requires`
//! word is a candidate prerequisite. Suggestions are only ever reported;
//! they are never added to the graph used for cycle detection and ordering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph::DependencyGraph;
use super::id::TaskId;

/// Confidence attached to every inferred edge (declared edges count as 1.0)
pub const INFERRED_CONFIDENCE: f64 = 0.4;

/// "A task mentioning `keyword` probably requires a task mentioning `requires`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRule {
    pub keyword: String,
    pub requires: String,
}

impl InferenceRule {
    pub fn new(keyword: impl Into<String>, requires: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            requires: requires.into(),
        }
    }

    /// Built-in rules used when the configuration does not list any
    pub fn defaults() -> Vec<InferenceRule> {
        [
            ("api", "database"),
            ("frontend", "api"),
            ("ui", "api"),
            ("test", "setup"),
            ("deploy", "test"),
            ("documentation", "api"),
        ]
        .into_iter()
        .map(|(k, r)| InferenceRule::new(k, r))
        .collect()
    }
}

/// A candidate edge produced by keyword matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedDependency {
    pub dependent: TaskId,
    pub prerequisite: TaskId,
    pub confidence: f64,
    pub reason: String,
}

/// Splits a title into lowercase alphanumeric words
fn words(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whole-word match, tolerating a plural `s`
fn mentions(words: &[String], term: &str) -> bool {
    let term = term.trim().to_lowercase();
    !term.is_empty()
        && words
            .iter()
            .any(|w| *w == term || w.strip_suffix('s') == Some(term.as_str()))
}

/// Suggests undeclared dependencies
///
/// Drops candidates that are self-edges, already required (directly or
/// transitively), or that would close a cycle. Each pair is suggested at
/// most once, for the first rule that produced it.
pub fn suggest_dependencies(
    graph: &DependencyGraph,
    rules: &[InferenceRule],
) -> Vec<SuggestedDependency> {
    let titles: Vec<Vec<String>> = graph
        .node_indices()
        .map(|idx| words(&graph.node(idx).title))
        .collect();

    let mut suggestions: Vec<SuggestedDependency> = Vec::new();

    for dependent in graph.node_indices() {
        for rule in rules {
            if !mentions(&titles[dependent.index()], &rule.keyword) {
                continue;
            }

            for prerequisite in graph.node_indices() {
                if prerequisite == dependent
                    || !mentions(&titles[prerequisite.index()], &rule.requires)
                    || mentions(&titles[prerequisite.index()], &rule.keyword)
                {
                    continue;
                }
                if graph.requires(dependent, prerequisite) || graph.requires(prerequisite, dependent)
                {
                    continue;
                }

                let dependent_id = graph.task_id(dependent);
                let prerequisite_id = graph.task_id(prerequisite);
                if suggestions
                    .iter()
                    .any(|s| &s.dependent == dependent_id && &s.prerequisite == prerequisite_id)
                {
                    continue;
                }

                suggestions.push(SuggestedDependency {
                    dependent: dependent_id.clone(),
                    prerequisite: prerequisite_id.clone(),
                    confidence: INFERRED_CONFIDENCE,
                    reason: format!("'{}' usually requires '{}'", rule.keyword, rule.requires),
                });
            }
        }
    }

    debug!(count = suggestions.len(), "inferred dependency suggestions");
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::TaskRegistry;
    use crate::domain::task::Task;

    fn task(id: &str, title: &str) -> Task {
        Task::new(id.parse().unwrap(), title).with_duration(1.0)
    }

    fn suggest(tasks: Vec<Task>) -> Vec<(String, String)> {
        let graph = DependencyGraph::build(&TaskRegistry::new(tasks, 1.0));
        suggest_dependencies(&graph, &InferenceRule::defaults())
            .into_iter()
            .map(|s| (s.dependent.to_string(), s.prerequisite.to_string()))
            .collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn api_suggests_database() {
        let found = suggest(vec![
            task("db", "Create database schema"),
            task("api", "Implement REST API"),
        ]);
        assert_eq!(found, vec![pair("api", "db")]);
    }

    #[test]
    fn declared_dependency_is_not_suggested() {
        let found = suggest(vec![
            task("db", "Create database schema"),
            task("api", "Implement REST API").depends_on("db"),
        ]);
        assert!(found.is_empty());
    }

    #[test]
    fn transitive_dependency_is_not_suggested() {
        let found = suggest(vec![
            task("db", "Create database schema"),
            task("models", "Data models").depends_on("db"),
            task("api", "Implement API").depends_on("models"),
        ]);
        assert!(found.is_empty());
    }

    #[test]
    fn cycle_closing_suggestion_is_dropped() {
        // db already requires api, so api -> db would close a loop
        let found = suggest(vec![
            task("api", "Implement API"),
            task("db", "Seed database via API").depends_on("api"),
        ]);
        assert!(found.is_empty());
    }

    #[test]
    fn matches_whole_words_and_plurals() {
        let found = suggest(vec![
            task("db", "Provision databases"),
            task("rapid", "Rapidly prototype"),
            task("api", "Public APIs"),
        ]);
        assert_eq!(found, vec![pair("api", "db")]);
    }

    #[test]
    fn suggestions_are_low_confidence() {
        let graph = DependencyGraph::build(&TaskRegistry::new(
            vec![task("db", "Database"), task("ui", "UI for the API")],
            1.0,
        ));
        let found = suggest_dependencies(&graph, &[InferenceRule::new("ui", "database")]);

        assert_eq!(found.len(), 1);
        assert!(found[0].confidence < 1.0);
        assert!(found[0].reason.contains("ui"));
    }

    #[test]
    fn empty_rules_suggest_nothing() {
        let graph = DependencyGraph::build(&TaskRegistry::new(
            vec![task("db", "Database"), task("api", "API")],
            1.0,
        ));
        assert!(suggest_dependencies(&graph, &[]).is_empty());
    }
}

//! Planning commands (plan, validate, suggest)

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};

use super::output::Output;
use crate::domain::{
    plan as run_pipeline, ExecutionPlan, InferenceRule, Issue, PlanError, PlanOutcome, Strategy,
    Task, TaskId, ValidationResult,
};
use crate::storage::{Config, TaskFile};

/// Reads a task file and keeps the titles around for display
fn load_tasks(output: &Output, file: &Path) -> Result<(Vec<Task>, HashMap<TaskId, String>)> {
    let tasks = TaskFile::new(file).read_all()?;
    output.verbose_ctx("load", &format!("Read {} tasks from {}", tasks.len(), file.display()));

    let mut titles = HashMap::new();
    for task in &tasks {
        titles
            .entry(task.id.clone())
            .or_insert_with(|| task.title.clone());
    }
    Ok((tasks, titles))
}

/// Validate a task file and print its execution plan
pub fn plan(
    output: &Output,
    config: &Config,
    file: &Path,
    strategy: Option<Strategy>,
    no_suggestions: bool,
) -> Result<()> {
    let (tasks, titles) = load_tasks(output, file)?;

    let mut ctx = config.planning_context(strategy);
    if no_suggestions {
        ctx = ctx.without_suggestions();
    }
    output.verbose_ctx("plan", &format!("Using strategy: {}", ctx.strategy));

    let outcome = run_pipeline(tasks, &ctx);

    if output.is_json() {
        output.data(&outcome_json(&outcome));
    } else {
        match &outcome.plan {
            Ok(plan) => print_plan(plan, &titles),
            Err(err) => println!("No execution plan: {}", err),
        }
        println!();
        print_report(&outcome.validation);
    }

    match outcome.plan {
        Ok(_) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Print the validation report; fails when the task set is invalid
pub fn validate(output: &Output, config: &Config, file: &Path, no_suggestions: bool) -> Result<()> {
    let (tasks, _) = load_tasks(output, file)?;

    let mut ctx = config.planning_context(None);
    if no_suggestions {
        ctx = ctx.without_suggestions();
    }

    let outcome = run_pipeline(tasks, &ctx);
    let validation = &outcome.validation;
    output.verbose_ctx(
        "validate",
        &format!(
            "{} error(s), {} warning(s)",
            validation.errors.len(),
            validation.warnings.len()
        ),
    );

    if output.is_json() {
        output.data(validation);
    } else {
        print_report(validation);
    }

    if !validation.is_valid {
        bail!(
            "Task set is invalid ({} error(s))",
            validation.errors.len()
        );
    }
    Ok(())
}

/// Show dependencies suggested by task titles
///
/// Runs even when suggestions are disabled in the project config.
pub fn suggest(output: &Output, config: &Config, file: &Path) -> Result<()> {
    let (tasks, titles) = load_tasks(output, file)?;

    let mut ctx = config.planning_context(None);
    if ctx.suggestions.is_none() {
        let rules = if config.project.inference.rules.is_empty() {
            InferenceRule::defaults()
        } else {
            config.project.inference.rules.clone()
        };
        ctx.suggestions = Some(rules);
    }

    let outcome = run_pipeline(tasks, &ctx);
    let suggestions = &outcome.suggestions;
    output.verbose_ctx("suggest", &format!("Found {} suggestions", suggestions.len()));

    if output.is_json() {
        output.data(suggestions);
    } else if suggestions.is_empty() {
        println!("No suggested dependencies.");
    } else {
        println!("Suggested dependencies ({}):", suggestions.len());
        println!("{:<30} {:<30} {:>5}  REASON", "TASK", "REQUIRES", "CONF");
        println!("{}", "-".repeat(90));
        for s in suggestions {
            println!(
                "{:<30} {:<30} {:>5.2}  {}",
                label(&s.dependent, &titles),
                label(&s.prerequisite, &titles),
                s.confidence,
                s.reason
            );
        }
    }

    Ok(())
}

/// JSON document for `plan`; `plan` is null when refused
fn outcome_json(outcome: &PlanOutcome) -> serde_json::Value {
    let (plan, error, cycles) = match &outcome.plan {
        Ok(plan) => (serde_json::to_value(plan).ok(), None, Vec::new()),
        Err(err) => {
            let cycles = match err {
                PlanError::CycleDetected { cycles } => cycles.clone(),
                PlanError::InvalidTaskSet { .. } => Vec::new(),
            };
            (None, Some(err.to_string()), cycles)
        }
    };

    serde_json::json!({
        "valid": outcome.validation.is_valid,
        "plan": plan,
        "error": error,
        "cycles": cycles,
        "validation": outcome.validation,
        "suggestions": outcome.suggestions,
    })
}

fn label(id: &TaskId, titles: &HashMap<TaskId, String>) -> String {
    match titles.get(id) {
        Some(title) => format!("{} ({})", id, title),
        None => id.to_string(),
    }
}

fn print_plan(plan: &ExecutionPlan, titles: &HashMap<TaskId, String>) {
    println!(
        "Execution plan: {} ({} tasks, {:.1}h critical path, {:.1}h total work)",
        plan.strategy,
        plan.len(),
        plan.critical_path_duration_hours,
        plan.total_duration_hours
    );

    if plan.is_empty() {
        println!("No tasks to plan.");
        return;
    }

    let timings: HashMap<&TaskId, _> = plan.timings.iter().map(|t| (&t.id, t)).collect();

    println!();
    println!(
        "{:>3}  {:<20} {:<36} {:>6} {:>6} {:>6}",
        "#", "ID", "TITLE", "HOURS", "START", "SLACK"
    );
    println!("{}", "-".repeat(84));
    for (i, id) in plan.order.iter().enumerate() {
        let title = titles.get(id).map(String::as_str).unwrap_or("");
        match timings.get(id) {
            Some(t) => println!(
                "{:>3}  {:<20} {:<36} {:>6.1} {:>6.1} {:>6.1}{}",
                i + 1,
                id,
                title,
                t.duration_hours,
                t.earliest_start,
                t.slack,
                if t.is_critical() { "  *" } else { "" }
            ),
            None => println!("{:>3}  {:<20} {}", i + 1, id, title),
        }
    }

    println!();
    let path: Vec<&str> = plan.critical_path.iter().map(|id| id.as_str()).collect();
    println!("Critical path: {}", path.join(" -> "));

    println!("Batches:");
    for (i, batch) in plan.batches.iter().enumerate() {
        let ids: Vec<&str> = batch.iter().map(|id| id.as_str()).collect();
        println!("  {}. {}", i + 1, ids.join(", "));
    }
}

fn print_issues(heading: &str, issues: &[Issue]) {
    println!("{} ({}):", heading, issues.len());
    for issue in issues {
        println!("  {}", issue);
    }
}

fn print_report(validation: &ValidationResult) {
    if validation.errors.is_empty() && validation.warnings.is_empty() {
        println!("No issues found.");
        return;
    }

    if !validation.errors.is_empty() {
        print_issues("Errors", &validation.errors);
    }
    if !validation.warnings.is_empty() {
        if !validation.errors.is_empty() {
            println!();
        }
        print_issues("Warnings", &validation.warnings);
    }
}

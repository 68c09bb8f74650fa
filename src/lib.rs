//! taskplan - dependency validation and execution planning for generated tasks
//!
//! Takes the task list produced by a task-generation step, checks that its
//! dependencies form a valid order, and computes an execution plan: a
//! deterministic sequence, the critical path, and parallel-safe batches.
//! Problems are collected into one validation report so a whole task list
//! can be corrected in a single pass.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    plan, Category, ExecutionPlan, PlanError, PlanOutcome, PlanningContext, Priority, Strategy,
    Task, TaskId, ValidationResult,
};

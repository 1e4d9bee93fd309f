// src/pipeline/mod.rs

//! Pipeline representation and execution.
//!
//! - [`model`] holds the immutable role/task records and the validated
//!   [`Pipeline`].
//! - [`graph`] keeps task adjacency and computes the execution order.
//! - [`results`] is the write-once store of task results for one run.
//! - [`context`] gathers prerequisite output for a task.
//! - [`prompt`] turns a role and task into generation input.
//! - [`executor`] runs everything, one task at a time.

pub mod context;
pub mod executor;
pub mod graph;
pub mod model;
pub mod prompt;
pub mod results;

pub use context::resolve_context;
pub use executor::{RunReport, SequentialExecutor, TaskRunState};
pub use graph::DagGraph;
pub use model::{Pipeline, Role, RoleId, Task, TaskId, TaskResult};
pub use results::ResultsStore;

//! Graph building and task execution.
//!
//! - [`graph`] turns ordered task keys into a chain graph
//! - [`processor`] decides how graph vertices are driven
//! - [`executor`] invokes task instances and records their results
//! - [`engine`] is the registration and run front end
//! - [`plan`] runs YAML plan files through an engine

pub mod engine;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod processor;
pub mod scope;

pub use engine::{Engine, TaskSpec};
pub use executor::Executor;
pub use graph::{GraphBuilder, TaskGraph, Vertex};
pub use plan::{PlanRunner, RunOutcome};
pub use processor::Processor;
pub use scope::RunScope;

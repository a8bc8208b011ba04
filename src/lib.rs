//! taskchain - in-process task orchestration.
//!
//! Register units of work, group them, chain them into a run and execute
//! them with the results of earlier steps visible to later ones.
//!
//! # Modules
//!
//! - [`task`] - Task definitions, per-run instances and title templates
//! - [`registry`] - Title and group registries
//! - [`context`] - Run contexts and the shared context store
//! - [`runner`] - Graph building, processors, the executor and the engine
//! - [`pipeline`] - Standalone named-step pipeline
//! - [`config`] - Plan files and engine settings
//! - [`shell`] - Shell command execution and shell-backed tasks
//! - [`cli`] - Command-line interface and argument parsing
//! - [`ui`] - Terminal output
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Value};
//! use taskchain::runner::{Engine, TaskSpec};
//! use taskchain::task::{strip_meta, Params};
//!
//! let engine = Engine::new();
//! let fetch = engine
//!     .register("fetch", "fetch-{fn_seq_id}", |_, _| Ok(json!("<html>")))
//!     .unwrap();
//! let size = engine
//!     .register("size", "", |params, scope| {
//!         let page = scope.step_result("0")?.unwrap_or(Value::Null);
//!         let extra = strip_meta(params).len();
//!         Ok(json!(page.as_str().map(str::len).unwrap_or(0) + extra))
//!     })
//!     .unwrap();
//!
//! let keys = engine
//!     .run_tasks(
//!         vec![
//!             TaskSpec::new(&fetch, Params::new()),
//!             TaskSpec::new(&size, Params::new()),
//!         ],
//!         Some("demo"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(keys, vec!["0.demo", "1.demo"]);
//! assert_eq!(engine.get_step(0, "demo").unwrap().title(), "fetch-0");
//! assert_eq!(engine.get_task("1.demo").unwrap().result(), Some(&json!(6)));
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod shell;
pub mod task;
pub mod ui;

pub use error::{ErrorKind, Result, TaskChainError};
pub use pipeline::{Pipeline, PipelineContext};
pub use runner::{Engine, TaskSpec};

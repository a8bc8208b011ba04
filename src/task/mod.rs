//! Task definitions and per-run task instances.
//!
//! - [`TaskDefinition`] is the registered, reusable unit of work
//! - [`TaskInstance`] is one parameterized invocation of it inside a run
//! - [`title`] resolves `{placeholder}` templates in task titles
//! - [`meta`] holds the run metadata injected into every call

pub mod definition;
pub mod instance;
pub mod meta;
pub mod title;

/// Parameter bag handed to a task body.
pub type Params = serde_json::Map<String, serde_json::Value>;

pub use definition::{TaskDefinition, TaskFn, TaskHandle};
pub use instance::{make_task_key, split_task_key, TaskInstance, TaskState, TaskSummary};
pub use meta::{strip_meta, RunMeta, META_KEY};
pub use title::{render_title, TitleVars};

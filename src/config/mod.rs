//! Plan files and engine settings.
//!
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use taskchain::config::{load_plan_file, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("plan.yml");
//! fs::write(&path, "tasks:\n  hello:\n    command: echo hi\n").unwrap();
//!
//! let plan = load_plan_file(&path).unwrap();
//! validate(&plan).unwrap();
//! assert!(plan.tasks.contains_key("hello"));
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_plan_file, parse_plan};
pub use schema::{EngineConfig, Plan, ProcessorKind, RunConfig, RunTaskConfig, TaskConfig};
pub use validator::{validate, validate_plan, ValidationError};

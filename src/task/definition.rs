//! Registered task definitions.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, TaskChainError};
use crate::runner::RunScope;

use super::Params;

/// Signature every task body implements.
///
/// The body receives its parameter bag (with run metadata injected under
/// [`META_KEY`](super::META_KEY)) and a [`RunScope`] for reading the results
/// of earlier steps.
pub type TaskFn = dyn Fn(Params, &RunScope<'_>) -> anyhow::Result<Value> + Send + Sync;

/// Shared handle to a registered task.
pub type TaskHandle = Arc<TaskDefinition>;

/// A reusable unit of work: identity, declared title and callable.
pub struct TaskDefinition {
    name: String,
    title: String,
    func: Box<TaskFn>,
}

impl TaskDefinition {
    /// Create a definition.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `name` is empty.
    pub fn new<F>(name: impl Into<String>, title: impl Into<String>, func: F) -> Result<Self>
    where
        F: Fn(Params, &RunScope<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TaskChainError::validation("task name must not be empty"));
        }

        Ok(Self {
            name,
            title: title.into(),
            func: Box::new(func),
        })
    }

    /// Identity the task was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared title; falls back to the name when none was given.
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Invoke the task body.
    pub fn call(&self, params: Params, scope: &RunScope<'_>) -> anyhow::Result<Value> {
        (self.func)(params, scope)
    }

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> TaskHandle {
        Arc::new(self)
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

//! Self-contained named-step pipeline.
//!
//! A [`Pipeline`] is a lighter sibling of the [`Engine`](crate::runner::Engine):
//! steps are registered under unique ids, receive per-step parameters and
//! run once each, in registration order. Steps added with
//! [`Pipeline::add_context_task`] also see the [`PipelineContext`], which
//! holds the results of the steps that ran before them.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TaskChainError};
use crate::runner::TaskGraph;
use crate::task::Params;

type PlainFn = dyn Fn(Params) -> anyhow::Result<Value> + Send + Sync;
type ContextFn = dyn Fn(&PipelineContext, Params) -> anyhow::Result<Value> + Send + Sync;

enum Step {
    Plain(Box<PlainFn>),
    WithContext(Box<ContextFn>),
}

/// Data shared by the steps of a pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    result: IndexMap<String, Value>,
    parameters: IndexMap<String, Params>,
    sequence: Vec<String>,
}

impl PipelineContext {
    /// Results recorded so far, in execution order.
    pub fn results(&self) -> &IndexMap<String, Value> {
        &self.result
    }

    pub fn result(&self, uid: &str) -> Option<&Value> {
        self.result.get(uid)
    }

    /// Parameters registered for a step.
    pub fn parameters(&self, uid: &str) -> Option<&Params> {
        self.parameters.get(uid)
    }

    /// Step ids in execution order.
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }
}

/// Ordered collection of named steps.
#[derive(Default)]
pub struct Pipeline {
    context: PipelineContext,
    steps: IndexMap<String, Step>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step that receives only its parameters.
    ///
    /// Re-adding an existing id replaces the step but keeps its position
    /// and parameters.
    pub fn add_task<F>(&mut self, uid: &str, func: F) -> Result<&mut Self>
    where
        F: Fn(Params) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_step(uid, Step::Plain(Box::new(func)))
    }

    /// Add a step that also receives the pipeline context.
    pub fn add_context_task<F>(&mut self, uid: &str, func: F) -> Result<&mut Self>
    where
        F: Fn(&PipelineContext, Params) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_step(uid, Step::WithContext(Box::new(func)))
    }

    /// Merge `params` into the parameters of step `uid`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Validation` when `params`
    /// is not a JSON object.
    pub fn parameter(&mut self, uid: &str, params: Value) -> Result<&mut Self> {
        let slot = self
            .context
            .parameters
            .get_mut(uid)
            .ok_or_else(|| TaskChainError::not_found("Task", uid))?;

        match params {
            Value::Object(map) => slot.extend(map),
            other => {
                return Err(TaskChainError::validation(format!(
                    "parameters for '{}' must be an object, got {}",
                    uid, other
                )))
            }
        }

        Ok(self)
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every step once, in registration order.
    ///
    /// Returns the results keyed by step id. A failing step aborts the run;
    /// results of earlier steps stay in the context.
    pub fn run(&mut self) -> Result<IndexMap<String, Value>> {
        let graph = TaskGraph::chain(self.context.sequence.iter().cloned())?;

        for uid in graph.topological_order()? {
            let step = self
                .steps
                .get(&uid)
                .ok_or_else(|| TaskChainError::not_found("Task", uid.as_str()))?;
            let params = self
                .context
                .parameters
                .get(&uid)
                .cloned()
                .unwrap_or_default();

            debug!("pipeline step '{}'", uid);
            let value = match step {
                Step::Plain(func) => func(params),
                Step::WithContext(func) => func(&self.context, params),
            }
            .map_err(TaskChainError::Task)?;

            self.context.result.insert(uid, value);
        }

        Ok(self.context.result.clone())
    }

    fn insert_step(&mut self, uid: &str, step: Step) -> Result<&mut Self> {
        if uid.trim().is_empty() {
            return Err(TaskChainError::validation("step id must not be empty"));
        }

        if !self.context.sequence.iter().any(|s| s == uid) {
            self.context.sequence.push(uid.to_string());
        }
        self.context.parameters.entry(uid.to_string()).or_default();
        self.steps.insert(uid.to_string(), step);
        Ok(self)
    }
}

//! Read access to a run from inside a task body.

use serde_json::Value;

use crate::context::ContextStore;
use crate::error::Result;
use crate::task::{make_task_key, RunMeta, TaskInstance};

/// Handed to every task body alongside its parameters.
///
/// Lookups read from the same store the executor writes to, so the result
/// of step `N` is visible from step `N + 1`.
#[derive(Debug, Clone, Copy)]
pub struct RunScope<'a> {
    store: &'a ContextStore,
    meta: &'a RunMeta,
    task_key: &'a str,
}

impl<'a> RunScope<'a> {
    pub fn new(store: &'a ContextStore, meta: &'a RunMeta, task_key: &'a str) -> Self {
        Self {
            store,
            meta,
            task_key,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.meta.run_id
    }

    pub fn current_step(&self) -> &str {
        &self.meta.current_step
    }

    pub fn task_key(&self) -> &str {
        self.task_key
    }

    pub fn meta(&self) -> &RunMeta {
        self.meta
    }

    /// Instance at step `seq_id` of the current run.
    pub fn step(&self, seq_id: &str) -> Result<TaskInstance> {
        self.store.step(seq_id, self.run_id())
    }

    /// Result recorded at step `seq_id` of the current run, if any.
    pub fn step_result(&self, seq_id: &str) -> Result<Option<Value>> {
        Ok(self.step(seq_id)?.result().cloned())
    }

    /// Instance under a full task key. A bare sequence id is read from the
    /// current run.
    pub fn task(&self, key: &str) -> Result<TaskInstance> {
        if key.contains('.') {
            self.store.instance(key)
        } else {
            self.store.instance(&make_task_key(key, self.run_id()))
        }
    }
}

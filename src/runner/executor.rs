//! Graph executor.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::context::ContextStore;
use crate::error::{Result, TaskChainError};
use crate::task::{split_task_key, RunMeta};

use super::graph::{TaskGraph, Vertex};
use super::processor::Processor;
use super::scope::RunScope;

/// Walks a [`TaskGraph`] and invokes each task instance it names.
#[derive(Debug, Clone)]
pub struct Executor {
    store: Arc<ContextStore>,
    processor: Processor,
}

impl Executor {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self {
            store,
            processor: Processor::default(),
        }
    }

    /// Use a different processing strategy.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    pub fn processor(&self) -> Processor {
        self.processor
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Execute every vertex of `graph` in dependency order.
    ///
    /// Returns the executed task keys in graph order. The first failing task
    /// aborts the walk; steps that completed before it keep their results.
    pub fn run(&self, graph: &TaskGraph) -> Result<Vec<String>> {
        self.processor.run(graph, |vertex| self.execute_vertex(vertex))?;
        Ok(graph.task_keys())
    }

    fn execute_vertex(&self, vertex: &Vertex) -> Result<()> {
        match vertex {
            Vertex::Task(key) => self.execute_task(key),
            Vertex::Group { name, graph } => {
                debug!("running group '{}' ({} step(s))", name, graph.len());
                for id in graph.topological_order()? {
                    if let Some(inner) = graph.vertex(&id) {
                        self.execute_vertex(inner)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Execute the instance stored under `task_key`.
    pub fn execute_task(&self, task_key: &str) -> Result<()> {
        let (seq_id, run_id) = split_task_key(task_key);

        let instance = self.store.with_run_mut(run_id, |run| {
            let mut instance = run.require(task_key)?.clone();
            if instance.is_executed() {
                return Err(TaskChainError::validation(format!(
                    "task '{}' has already been executed",
                    task_key
                )));
            }
            if instance.resolve_title()? {
                run.update(instance.clone())?;
            }
            Ok(instance)
        })?;

        debug!("executing {} ({})", task_key, instance.title());

        let meta = RunMeta::new(run_id, seq_id);
        let params = instance.call_parameters(&meta);
        let scope = RunScope::new(&self.store, &meta, task_key);

        let started = Instant::now();
        let value = instance.function().call(params, &scope).map_err(|e| {
            warn!("task {} failed: {:#}", task_key, e);
            TaskChainError::Task(e)
        })?;
        let elapsed = started.elapsed();

        self.store
            .with_run_mut(run_id, |run| run.complete(task_key, value, elapsed))?;
        debug!("finished {} in {:?}", task_key, elapsed);

        Ok(())
    }
}

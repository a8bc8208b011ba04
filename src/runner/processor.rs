//! Strategies for walking a [`TaskGraph`].

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TaskChainError};

use super::graph::{TaskGraph, Vertex};

/// How vertices of a graph are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Processor {
    /// One vertex at a time, in topological order.
    #[default]
    Sequential,
    /// Each dependency layer runs on up to `workers` scoped threads.
    MultiThread { workers: usize },
}

impl Processor {
    /// Drive every vertex of `graph` through `exec`.
    ///
    /// Stops at the first failure. In multi-thread mode the remaining
    /// vertices of the failing layer still finish; later layers never start.
    pub fn run<F>(&self, graph: &TaskGraph, exec: F) -> Result<()>
    where
        F: Fn(&Vertex) -> Result<()> + Sync,
    {
        match *self {
            Processor::Sequential => {
                for id in graph.topological_order()? {
                    if let Some(vertex) = graph.vertex(&id) {
                        exec(vertex)?;
                    }
                }
                Ok(())
            }
            Processor::MultiThread { workers } => {
                let workers = workers.max(1);
                for layer in graph.parallel_layers()? {
                    let vertices: Vec<&Vertex> =
                        layer.iter().filter_map(|id| graph.vertex(id)).collect();

                    for batch in vertices.chunks(workers) {
                        debug!("running {} vertex(es) concurrently", batch.len());
                        run_batch(batch, &exec)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn run_batch<F>(batch: &[&Vertex], exec: &F) -> Result<()>
where
    F: Fn(&Vertex) -> Result<()> + Sync,
{
    if let [single] = batch {
        return exec(*single);
    }

    let outcomes: Vec<Result<()>> = thread::scope(|scope| {
        let handles: Vec<_> = batch
            .iter()
            .map(|vertex| scope.spawn(move || exec(*vertex)))
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(TaskChainError::Internal {
                        message: "worker thread panicked".to_string(),
                    })
                })
            })
            .collect()
    });

    outcomes.into_iter().collect()
}

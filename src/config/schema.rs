//! Configuration schema definitions.
//!
//! These structs map to the YAML plan file format and to the engine
//! settings embedded in it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::runner::Processor;
use crate::task::Params;

/// Root structure of a plan file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    /// Engine settings
    pub settings: EngineConfig,

    /// Task definitions, in declaration order
    pub tasks: IndexMap<String, TaskConfig>,

    /// Group definitions: name to ordered task names
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Vec<String>>,

    /// Runs to execute, in order
    pub runs: Vec<RunConfig>,
}

/// Which processor drives the task graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    #[default]
    Sequential,
    Parallel,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Processing strategy
    pub processor: ProcessorKind,

    /// Maximum concurrent vertices for the parallel processor
    #[serde(
        default = "default_workers",
        skip_serializing_if = "is_default_workers"
    )]
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorKind::default(),
            workers: default_workers(),
        }
    }
}

impl EngineConfig {
    /// The processor these settings select.
    pub fn processor(&self) -> Processor {
        match self.processor {
            ProcessorKind::Sequential => Processor::Sequential,
            ProcessorKind::Parallel => Processor::MultiThread {
                workers: self.workers.max(1),
            },
        }
    }
}

fn default_workers() -> usize {
    4
}

fn is_default_workers(v: &usize) -> bool {
    *v == default_workers()
}

/// A shell-command task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Title template; defaults to the task name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Command run through `sh -c`
    pub command: String,

    /// Extra environment variables
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// One task of an explicit task list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunTaskConfig {
    /// Name of the task to run
    pub task: String,

    /// Parameters for this invocation
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

/// A run: either an explicit task list or a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Explicit run id for task lists; generated when absent. Group runs
    /// always use the group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Explicit task list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<RunTaskConfig>,

    /// Group to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Positional parameters for the group's members
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Params>,
}

impl RunConfig {
    /// Short label used in logs and output.
    pub fn label(&self, index: usize) -> String {
        match &self.group {
            Some(group) => format!("group '{}'", group),
            None => format!("run #{}", index + 1),
        }
    }
}

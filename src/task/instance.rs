//! Task instances: one invocation of a task definition within a run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, TaskChainError};

use super::meta::{RunMeta, META_KEY};
use super::title::{is_template, render_title, TitleVars};
use super::{Params, TaskHandle};

/// Lifecycle of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Built, not yet executed.
    Constructed,
    /// Title template resolved at the start of execution.
    TitleResolved,
    /// Result recorded.
    Executed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Constructed => "constructed",
            TaskState::TitleResolved => "title_resolved",
            TaskState::Executed => "executed",
        };
        write!(f, "{}", s)
    }
}

/// Build the canonical key for a step: `seq_id` or `seq_id.run_id`.
pub fn make_task_key(seq_id: &str, run_id: &str) -> String {
    if run_id.is_empty() {
        seq_id.to_string()
    } else {
        format!("{}.{}", seq_id, run_id)
    }
}

/// Split a task key into `(seq_id, run_id)` on the first `.`.
pub fn split_task_key(task_key: &str) -> (&str, &str) {
    task_key.split_once('.').unwrap_or((task_key, ""))
}

/// One concrete, parameterized invocation of a task within a run.
#[derive(Debug, Clone)]
pub struct TaskInstance {
    function: TaskHandle,
    parameters: Params,
    run_id: String,
    seq_id: String,
    title: String,
    title_resolved: bool,
    task_key: String,
    result: Option<Value>,
    finished_at: Option<DateTime<Utc>>,
    duration: Option<Duration>,
}

impl TaskInstance {
    /// Create an instance.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `seq_id` is empty or contains `.`.
    pub fn new(
        function: TaskHandle,
        parameters: Params,
        run_id: impl Into<String>,
        seq_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self> {
        let run_id = run_id.into();
        let seq_id = seq_id.into();

        if seq_id.is_empty() {
            return Err(TaskChainError::validation("sequence id is empty"));
        }
        if seq_id.contains('.') {
            return Err(TaskChainError::validation(format!(
                "sequence id '{}' must not contain '.'",
                seq_id
            )));
        }

        let task_key = make_task_key(&seq_id, &run_id);

        Ok(Self {
            function,
            parameters,
            run_id,
            seq_id,
            title: title.into(),
            title_resolved: false,
            task_key,
            result: None,
            finished_at: None,
            duration: None,
        })
    }

    pub fn function(&self) -> &TaskHandle {
        &self.function
    }

    /// Identity of the underlying task definition.
    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn parameters(&self) -> &Params {
        &self.parameters
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn seq_id(&self) -> &str {
        &self.seq_id
    }

    /// Current title; may still hold placeholders before execution.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Canonical key of this instance (DAG vertex and run context key).
    pub fn task_key(&self) -> &str {
        &self.task_key
    }

    /// Value returned by the task body, once executed.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn state(&self) -> TaskState {
        if self.result.is_some() {
            TaskState::Executed
        } else if self.title_resolved {
            TaskState::TitleResolved
        } else {
            TaskState::Constructed
        }
    }

    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }

    /// Resolve the title template, at most once.
    ///
    /// Returns `true` when the stored title changed and the instance should
    /// be persisted again.
    pub fn resolve_title(&mut self) -> Result<bool> {
        if self.title_resolved {
            return Ok(false);
        }

        if !is_template(&self.title) {
            self.title_resolved = true;
            return Ok(false);
        }

        let vars = TitleVars {
            task_key: &self.task_key,
            name: self.function.name(),
            run_id: &self.run_id,
            seq_id: &self.seq_id,
        };
        let rendered = render_title(&self.title, &vars)?;

        self.title = rendered;
        self.title_resolved = true;
        Ok(true)
    }

    /// Parameters handed to the task body: the stored parameters plus the
    /// injected run metadata.
    pub fn call_parameters(&self, meta: &RunMeta) -> Params {
        let mut params = self.parameters.clone();
        params.insert(META_KEY.to_string(), meta.to_value());
        params
    }

    /// Record the value returned by the task body.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a result was already recorded.
    pub fn record_result(&mut self, value: Value, duration: Duration) -> Result<()> {
        if self.result.is_some() {
            return Err(TaskChainError::validation(format!(
                "task '{}' has already been executed",
                self.task_key
            )));
        }

        self.result = Some(value);
        self.duration = Some(duration);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Serializable snapshot of this instance.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_key: self.task_key.clone(),
            name: self.name().to_string(),
            title: self.title.clone(),
            run_id: self.run_id.clone(),
            seq_id: self.seq_id.clone(),
            state: self.state(),
            parameters: self.parameters.clone(),
            result: self.result.clone(),
            finished_at: self.finished_at,
            duration_ms: self.duration.map(|d| d.as_millis() as u64),
        }
    }
}

/// Serializable view of a [`TaskInstance`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task_key: String,
    pub name: String,
    pub title: String,
    pub run_id: String,
    pub seq_id: String,
    pub state: TaskState,
    pub parameters: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

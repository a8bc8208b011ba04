//! Orchestration entry points.
//!
//! [`Engine`] ties the pieces together: it registers task definitions and
//! groups into a [`ContextStore`], turns task lists into run contexts,
//! builds the chain graph over their keys and hands it to the [`Executor`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::context::{
    ContextStore, Entity, GroupBinder, RunBinding, RunContext, RunId, TitleBinding,
};
use crate::error::{Result, TaskChainError};
use crate::task::{Params, TaskDefinition, TaskHandle, TaskInstance, META_KEY};

use super::executor::Executor;
use super::graph::{TaskGraph, Vertex};
use super::processor::Processor;
use super::scope::RunScope;

/// One entry of a task list handed to [`Engine::run_tasks`].
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub task: TaskHandle,
    pub params: Params,
    /// Explicit sequence id; defaults to the position in the list.
    pub seq: Option<String>,
}

impl TaskSpec {
    pub fn new(task: &TaskHandle, params: Params) -> Self {
        Self {
            task: Arc::clone(task),
            params,
            seq: None,
        }
    }

    /// Override the sequence id.
    pub fn with_seq(mut self, seq: impl Into<String>) -> Self {
        self.seq = Some(seq.into());
        self
    }
}

/// Registration and execution front end over a shared [`ContextStore`].
#[derive(Debug, Clone)]
pub struct Engine {
    store: Arc<ContextStore>,
    executor: Executor,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with a fresh store and the sequential processor.
    pub fn new() -> Self {
        Self::with_store(ContextStore::shared())
    }

    /// Create an engine over an existing store.
    pub fn with_store(store: Arc<ContextStore>) -> Self {
        Self {
            executor: Executor::new(Arc::clone(&store)),
            store,
        }
    }

    /// Create an engine configured from engine settings.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new().with_processor(config.processor())
    }

    /// Use a different processing strategy.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.executor = self.executor.with_processor(processor);
        self
    }

    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    pub fn processor(&self) -> Processor {
        self.executor.processor()
    }

    /// Register a task and bind its title.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `name` is empty.
    pub fn register<F>(&self, name: &str, title: &str, func: F) -> Result<TaskHandle>
    where
        F: Fn(Params, &RunScope<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register_definition(TaskDefinition::new(name, title, func)?)
    }

    /// Register an already built definition and bind its title.
    pub fn register_definition(&self, definition: TaskDefinition) -> Result<TaskHandle> {
        self.register_title(definition.name(), definition.title())?;
        Ok(definition.into_handle())
    }

    /// Bind `title` to `identity`, overwriting any earlier binding.
    pub fn register_title(&self, identity: &str, title: &str) -> Result<()> {
        self.store.add(Entity::Title(TitleBinding {
            identity: identity.to_string(),
            title: title.to_string(),
        }))
    }

    /// Create a new group.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateGroup` if the name already has members.
    pub fn create_group(&self, name: &str) -> Result<GroupBinder> {
        self.store.create_group(name)
    }

    /// Ordered members of a group.
    pub fn members(&self, group: &str) -> Result<Vec<TaskHandle>> {
        self.store.group(group)
    }

    /// Run a task list as one chain.
    ///
    /// With `run_id` absent (or empty) a fresh [`RunId`] is generated. Any
    /// run context already stored under the id is replaced.
    ///
    /// Returns the task keys in execution order.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty list, a parameter bag using the
    /// reserved `_META_` name or an invalid sequence id. Task failures pass
    /// through as [`TaskChainError::Task`].
    pub fn run_tasks(&self, specs: Vec<TaskSpec>, run_id: Option<&str>) -> Result<Vec<String>> {
        let (run_id, context, keys) = self.prepare_run(specs, run_id)?;
        let graph = TaskGraph::chain(keys)?;
        self.store_run(&run_id, context)?;

        let executed = self.executor.run(&graph)?;
        info!("run {} finished ({} task(s))", run_id, executed.len());
        Ok(executed)
    }

    /// Run the members of a group with positional parameters.
    ///
    /// Members without a matching entry get an empty parameter bag; extra
    /// entries are ignored. The group name doubles as the run id.
    pub fn run_group(&self, name: &str, params: Vec<Params>) -> Result<Vec<String>> {
        let specs = self.group_specs(name, params)?;
        self.run_tasks(specs, Some(name))
    }

    /// Run several groups, each as one atomic vertex.
    ///
    /// The groups have no edges between them, so a multi-thread processor
    /// runs them side by side. Returns each group's keys in input order.
    pub fn run_groups(&self, groups: Vec<(String, Vec<Params>)>) -> Result<Vec<Vec<String>>> {
        if groups.is_empty() {
            return Err(TaskChainError::validation("no groups to run"));
        }

        // Nothing is stored until every group resolved and the graph built.
        let mut seen = HashSet::new();
        let mut builder = TaskGraph::builder();
        let mut prepared = Vec::with_capacity(groups.len());
        let mut all_keys = Vec::with_capacity(groups.len());

        for (name, params) in groups {
            if !seen.insert(name.clone()) {
                return Err(TaskChainError::validation(format!(
                    "group '{}' listed more than once",
                    name
                )));
            }
            let specs = self.group_specs(&name, params)?;
            let (run_id, context, keys) = self.prepare_run(specs, Some(&name))?;
            let graph = TaskGraph::chain(keys.iter().cloned())?;
            builder = builder.add_vertex(Vertex::Group { name, graph }, Vec::new());
            prepared.push((run_id, context));
            all_keys.push(keys);
        }

        let graph = builder.build()?;
        for (run_id, context) in prepared {
            self.store_run(&run_id, context)?;
        }
        self.executor.run(&graph)?;
        info!("{} group run(s) finished", all_keys.len());
        Ok(all_keys)
    }

    /// Instance at step `step` of run `run_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the run or step does not exist.
    pub fn get_step(&self, step: impl fmt::Display, run_id: &str) -> Result<TaskInstance> {
        self.store.step(&step.to_string(), run_id)
    }

    /// Instance stored under a full task key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the run or key does not exist.
    pub fn get_task(&self, task_key: &str) -> Result<TaskInstance> {
        self.store.instance(task_key)
    }

    /// Snapshot of a whole run.
    pub fn get_run(&self, run_id: &str) -> Result<RunContext> {
        self.store.run(run_id)
    }

    /// Discard every registration and run.
    pub fn reset(&self) -> Result<()> {
        self.store.reset()
    }

    fn group_specs(&self, name: &str, params: Vec<Params>) -> Result<Vec<TaskSpec>> {
        let members = self.store.group(name)?;
        if params.len() > members.len() {
            debug!(
                "group '{}': ignoring {} extra parameter set(s)",
                name,
                params.len() - members.len()
            );
        }

        let mut params = params.into_iter();
        Ok(members
            .iter()
            .map(|task| TaskSpec::new(task, params.next().unwrap_or_default()))
            .collect())
    }

    /// Build instances for `specs` into a run context, without storing it.
    fn prepare_run(
        &self,
        specs: Vec<TaskSpec>,
        run_id: Option<&str>,
    ) -> Result<(String, RunContext, Vec<String>)> {
        if specs.is_empty() {
            return Err(TaskChainError::validation("task list is empty"));
        }

        let run_id = match run_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => RunId::generate()?.to_string(),
        };

        let mut context = RunContext::new();
        let mut keys = Vec::with_capacity(specs.len());

        for (index, spec) in specs.into_iter().enumerate() {
            if spec.params.contains_key(META_KEY) {
                return Err(TaskChainError::validation(format!(
                    "parameter name '{}' is reserved (task '{}')",
                    META_KEY,
                    spec.task.name()
                )));
            }

            let title = self.store.title_for(&spec.task)?;
            let seq_id = spec.seq.unwrap_or_else(|| index.to_string());
            let instance =
                TaskInstance::new(spec.task, spec.params, run_id.as_str(), seq_id, title)?;

            keys.push(instance.task_key().to_string());
            context.insert(instance)?;
        }

        debug!("prepared run {} with {} task(s)", run_id, keys.len());
        Ok((run_id, context, keys))
    }

    /// Store `context` under `run_id`, replacing any earlier run.
    fn store_run(&self, run_id: &str, context: RunContext) -> Result<()> {
        self.store.add(Entity::Run(RunBinding {
            run_id: run_id.to_string(),
            context,
        }))
    }
}

//! Process-wide context store.
//!
//! The [`ContextStore`] owns every title binding, group and run context.
//! It is constructed explicitly and shared by `Arc` handle; nothing in the
//! engine reaches for hidden global state. All access goes through an
//! internal `RwLock`, and no lock is held while task bodies run.

use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, TaskChainError};
use crate::registry::{GroupRegistry, TitleRegistry};
use crate::task::{split_task_key, TaskDefinition, TaskHandle, TaskInstance};

use super::run_context::RunContext;

/// Title bound to a task identity.
#[derive(Debug, Clone)]
pub struct TitleBinding {
    pub identity: String,
    pub title: String,
}

/// A task appended to a named group.
#[derive(Debug, Clone)]
pub struct GroupBinding {
    pub group: String,
    pub task: TaskHandle,
}

/// A run context stored under its run id.
#[derive(Debug, Clone)]
pub struct RunBinding {
    pub run_id: String,
    pub context: RunContext,
}

/// Anything that can be written into the store.
#[derive(Debug, Clone)]
pub enum Entity {
    Title(TitleBinding),
    Group(GroupBinding),
    Run(RunBinding),
}

/// Store partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Titles,
    Groups,
    Runs,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Titles => "titles",
            Partition::Groups => "groups",
            Partition::Runs => "runs",
        }
    }
}

impl FromStr for Partition {
    type Err = TaskChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "titles" | "title" => Ok(Partition::Titles),
            "groups" | "group" => Ok(Partition::Groups),
            "runs" | "run" => Ok(Partition::Runs),
            other => Err(TaskChainError::not_found("Partition", other)),
        }
    }
}

/// Snapshot returned by [`ContextStore::get`].
#[derive(Debug, Clone)]
pub enum PartitionEntry {
    Titles(IndexMap<String, String>),
    Title(String),
    Groups(IndexMap<String, Vec<TaskHandle>>),
    Group(Vec<TaskHandle>),
    Runs(IndexMap<String, RunContext>),
    Run(RunContext),
}

#[derive(Debug, Default)]
struct Partitions {
    titles: TitleRegistry,
    groups: GroupRegistry,
    runs: IndexMap<String, RunContext>,
}

/// Registry binding group data, title data and run data.
#[derive(Debug, Default)]
pub struct ContextStore {
    state: RwLock<Partitions>,
}

impl ContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind a shared handle.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Route an entity into its partition.
    ///
    /// Title bindings overwrite, group bindings append, run bindings replace
    /// any run context stored under the same id.
    pub fn add(&self, entity: Entity) -> Result<()> {
        let mut state = self.write()?;

        match entity {
            Entity::Title(binding) => {
                debug!("title '{}' bound to '{}'", binding.title, binding.identity);
                state.titles.register(binding.identity, binding.title)?;
            }
            Entity::Group(binding) => {
                if binding.group.is_empty() {
                    return Err(TaskChainError::validation("group name must not be empty"));
                }
                debug!(
                    "task '{}' added to group '{}'",
                    binding.task.name(),
                    binding.group
                );
                state.groups.append(binding.group, binding.task);
            }
            Entity::Run(binding) => {
                if binding.run_id.is_empty() {
                    return Err(TaskChainError::validation("run id must not be empty"));
                }
                debug!(
                    "run context '{}' stored with {} task(s)",
                    binding.run_id,
                    binding.context.len()
                );
                state.runs.insert(binding.run_id, binding.context);
            }
        }

        Ok(())
    }

    /// Read a whole partition (`key = None`) or one keyed value.
    pub fn get(&self, partition: Partition, key: Option<&str>) -> Result<PartitionEntry> {
        let state = self.read()?;

        let entry = match (partition, key) {
            (Partition::Titles, None) => PartitionEntry::Titles(state.titles.as_map().clone()),
            (Partition::Titles, Some(key)) => {
                PartitionEntry::Title(state.titles.require(key)?.to_string())
            }
            (Partition::Groups, None) => PartitionEntry::Groups(state.groups.as_map().clone()),
            (Partition::Groups, Some(key)) => {
                PartitionEntry::Group(state.groups.members(key)?.to_vec())
            }
            (Partition::Runs, None) => PartitionEntry::Runs(state.runs.clone()),
            (Partition::Runs, Some(key)) => PartitionEntry::Run(
                state
                    .runs
                    .get(key)
                    .cloned()
                    .ok_or_else(|| TaskChainError::not_found("Run", key))?,
            ),
        };

        Ok(entry)
    }

    /// Title bound to `identity`.
    pub fn title(&self, identity: &str) -> Result<String> {
        Ok(self.read()?.titles.require(identity)?.to_string())
    }

    /// Title to use for a new instance of `task`: the registered binding,
    /// else the definition's declared title.
    pub fn title_for(&self, task: &TaskDefinition) -> Result<String> {
        let state = self.read()?;
        Ok(state
            .titles
            .get(task.name())
            .filter(|title| !title.is_empty())
            .unwrap_or(task.title())
            .to_string())
    }

    /// Reserve a new group name and return a binder for adding members.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateGroup` if the name already has members.
    pub fn create_group(self: &Arc<Self>, name: impl Into<String>) -> Result<GroupBinder> {
        let name = name.into();
        self.read()?.groups.ensure_available(&name)?;

        Ok(GroupBinder {
            store: Arc::clone(self),
            name,
        })
    }

    /// Ordered members of a group.
    pub fn group(&self, name: &str) -> Result<Vec<TaskHandle>> {
        Ok(self.read()?.groups.members(name)?.to_vec())
    }

    /// Registered group names.
    pub fn group_names(&self) -> Result<Vec<String>> {
        Ok(self.read()?.groups.names().map(String::from).collect())
    }

    /// Snapshot of the run context stored under `run_id`.
    pub fn run(&self, run_id: &str) -> Result<RunContext> {
        self.read()?
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| TaskChainError::not_found("Run", run_id))
    }

    /// Snapshot of the instance stored under a full task key.
    pub fn instance(&self, task_key: &str) -> Result<TaskInstance> {
        let (_, run_id) = split_task_key(task_key);
        let state = self.read()?;
        let run = state
            .runs
            .get(run_id)
            .ok_or_else(|| TaskChainError::not_found("Run", run_id))?;
        Ok(run.require(task_key)?.clone())
    }

    /// Snapshot of the instance at step `seq_id` of a run.
    pub fn step(&self, seq_id: &str, run_id: &str) -> Result<TaskInstance> {
        let state = self.read()?;
        let run = state
            .runs
            .get(run_id)
            .ok_or_else(|| TaskChainError::not_found("Run", run_id))?;
        run.step(seq_id)
            .cloned()
            .ok_or_else(|| TaskChainError::not_found("Step", format!("{}.{}", seq_id, run_id)))
    }

    /// Mutate the run context stored under `run_id` in place.
    pub fn with_run_mut<T>(
        &self,
        run_id: &str,
        f: impl FnOnce(&mut RunContext) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.write()?;
        let run = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| TaskChainError::not_found("Run", run_id))?;
        f(run)
    }

    /// Discard every partition's content.
    pub fn reset(&self) -> Result<()> {
        *self.write()? = Partitions::default();
        debug!("context store reset");
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Partitions>> {
        self.state.read().map_err(|_| TaskChainError::Internal {
            message: "context store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Partitions>> {
        self.state.write().map_err(|_| TaskChainError::Internal {
            message: "context store lock poisoned".to_string(),
        })
    }
}

/// Appends tasks to a group created with [`ContextStore::create_group`].
#[derive(Debug, Clone)]
pub struct GroupBinder {
    store: Arc<ContextStore>,
    name: String,
}

impl GroupBinder {
    /// Name of the bound group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append `task` to the group.
    pub fn add(&self, task: &TaskHandle) -> Result<&Self> {
        self.store.add(Entity::Group(GroupBinding {
            group: self.name.clone(),
            task: Arc::clone(task),
        }))?;
        Ok(self)
    }
}

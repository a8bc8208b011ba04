//! Per-run mapping of step keys to task instances.

use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Result, TaskChainError};
use crate::task::{split_task_key, TaskInstance};

/// Ordered task instances of one run, keyed by task key.
///
/// A key may be written at most once while present. Re-inserting an
/// occupied key fails with `DuplicateKey`; removing it first makes the slot
/// writable again. Updates of an existing entry (title resolution, results)
/// go through [`RunContext::update`] and [`RunContext::complete`].
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    tasks: IndexMap<String, TaskInstance>,
}

impl RunContext {
    /// Create an empty run context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an instance under `key`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if `key` is already occupied.
    pub fn set(&mut self, key: impl Into<String>, instance: TaskInstance) -> Result<()> {
        let key = key.into();
        if self.tasks.contains_key(&key) {
            return Err(TaskChainError::DuplicateKey { key });
        }
        self.tasks.insert(key, instance);
        Ok(())
    }

    /// Write an instance under its own task key.
    pub fn insert(&mut self, instance: TaskInstance) -> Result<()> {
        self.set(instance.task_key().to_string(), instance)
    }

    /// Replace the instance stored under its task key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no instance occupies that key.
    pub fn update(&mut self, instance: TaskInstance) -> Result<()> {
        let slot = self
            .tasks
            .get_mut(instance.task_key())
            .ok_or_else(|| TaskChainError::not_found("Task", instance.task_key()))?;
        *slot = instance;
        Ok(())
    }

    /// Record the result of the instance under `key`.
    pub fn complete(&mut self, key: &str, value: Value, duration: Duration) -> Result<()> {
        self.tasks
            .get_mut(key)
            .ok_or_else(|| TaskChainError::not_found("Task", key))?
            .record_result(value, duration)
    }

    /// Remove the instance under `key`, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<TaskInstance> {
        self.tasks.shift_remove(key)
    }

    /// Look up an instance by full key.
    pub fn get(&self, key: &str) -> Option<&TaskInstance> {
        self.tasks.get(key)
    }

    /// Look up an instance by full key, failing if absent.
    pub fn require(&self, key: &str) -> Result<&TaskInstance> {
        self.get(key)
            .ok_or_else(|| TaskChainError::not_found("Task", key))
    }

    /// Find the instance occupying step `seq_id`.
    pub fn step(&self, seq_id: &str) -> Option<&TaskInstance> {
        self.tasks
            .iter()
            .find(|(key, _)| split_task_key(key).0 == seq_id)
            .map(|(_, instance)| instance)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }

    /// Task keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskInstance)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether every instance has recorded a result.
    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(TaskInstance::is_executed)
    }
}

//! Named, ordered groups of task definitions.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, TaskChainError};
use crate::task::TaskHandle;

/// Maps a group name to its ordered member tasks.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: IndexMap<String, Vec<TaskHandle>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `name` can be used for a new group.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty name and `DuplicateGroup` if the
    /// name already has members.
    pub fn ensure_available(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TaskChainError::validation("group name must not be empty"));
        }
        if self.groups.get(name).is_some_and(|members| !members.is_empty()) {
            return Err(TaskChainError::DuplicateGroup {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Append `task` to the group, creating the group on first use.
    pub fn append(&mut self, name: impl Into<String>, task: TaskHandle) {
        self.groups.entry(name.into()).or_default().push(task);
    }

    /// Ordered members of a group.
    pub fn members(&self, name: &str) -> Result<&[TaskHandle]> {
        self.groups
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| TaskChainError::not_found("Group", name))
    }

    /// Whether `task` is a member of the group.
    pub fn contains(&self, name: &str, task: &TaskHandle) -> bool {
        self.groups
            .get(name)
            .is_some_and(|members| members.iter().any(|m| Arc::ptr_eq(m, task)))
    }

    /// Group names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &IndexMap<String, Vec<TaskHandle>> {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDefinition;
    use serde_json::Value;

    fn handle(name: &str) -> TaskHandle {
        TaskDefinition::new(name, "", |_, _| Ok(Value::Null))
            .unwrap()
            .into_handle()
    }

    #[test]
    fn append_preserves_order() {
        let mut groups = GroupRegistry::new();
        let a = handle("a");
        let b = handle("b");
        groups.append("abg", a.clone());
        groups.append("abg", b.clone());

        let members = groups.members("abg").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name(), "a");
        assert_eq!(members[1].name(), "b");
        assert!(groups.contains("abg", &a));
    }

    #[test]
    fn ensure_available_rejects_used_name() {
        let mut groups = GroupRegistry::new();
        groups.append("a-group", handle("t"));

        let result = groups.ensure_available("a-group");
        assert!(matches!(result, Err(TaskChainError::DuplicateGroup { .. })));
        assert_eq!(groups.members("a-group").unwrap().len(), 1);
    }

    #[test]
    fn ensure_available_accepts_new_name() {
        let mut groups = GroupRegistry::new();
        groups.append("a-group", handle("t"));
        assert!(groups.ensure_available("b-group").is_ok());
        assert!(groups.ensure_available("").is_err());
    }

    #[test]
    fn members_missing_is_lookup_error() {
        let groups = GroupRegistry::new();
        assert!(matches!(
            groups.members("nope"),
            Err(TaskChainError::NotFound { .. })
        ));
    }

    #[test]
    fn names_keep_registration_order() {
        let mut groups = GroupRegistry::new();
        groups.append("a-group", handle("t"));
        groups.append("b-group", handle("u"));
        let names: Vec<_> = groups.names().collect();
        assert_eq!(names, vec!["a-group", "b-group"]);
    }
}

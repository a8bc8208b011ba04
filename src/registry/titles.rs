//! Task identity to title bindings.

use indexmap::IndexMap;

use crate::error::{Result, TaskChainError};

/// Maps a task identity to its title template.
#[derive(Debug, Clone, Default)]
pub struct TitleRegistry {
    titles: IndexMap<String, String>,
}

impl TitleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `title` to `identity`, overwriting any earlier binding.
    pub fn register(&mut self, identity: impl Into<String>, title: impl Into<String>) -> Result<()> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(TaskChainError::validation("title identity must not be empty"));
        }
        self.titles.insert(identity, title.into());
        Ok(())
    }

    pub fn get(&self, identity: &str) -> Option<&str> {
        self.titles.get(identity).map(String::as_str)
    }

    /// Look up a title, failing if the identity has none.
    pub fn require(&self, identity: &str) -> Result<&str> {
        self.get(identity)
            .ok_or_else(|| TaskChainError::not_found("Title", identity))
    }

    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

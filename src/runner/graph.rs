//! Task graph for execution ordering.
//!
//! Runs build a strict linear chain over their task keys: each step depends
//! only on its immediate predecessor. A whole group run may also sit in a
//! larger graph as one atomic [`Vertex::Group`], which is what lets a
//! multi-worker processor run sibling groups side by side.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{Result, TaskChainError};

/// A node of the task graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Vertex {
    /// A single task instance, identified by its task key.
    Task(String),
    /// A nested chain executed as one unit.
    Group { name: String, graph: TaskGraph },
}

impl Vertex {
    /// Identifier of the vertex inside its graph.
    pub fn id(&self) -> &str {
        match self {
            Vertex::Task(key) => key,
            Vertex::Group { name, .. } => name,
        }
    }

    /// Task keys covered by this vertex, in execution order.
    pub fn task_keys(&self) -> Vec<String> {
        match self {
            Vertex::Task(key) => vec![key.clone()],
            Vertex::Group { graph, .. } => graph.task_keys(),
        }
    }
}

/// Represents the dependency relationships between vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    /// Vertices in insertion order.
    vertices: IndexMap<String, Vertex>,
    /// Map of vertex id to its direct dependencies.
    dependencies: HashMap<String, HashSet<String>>,
    /// Map of vertex id to vertices that depend on it.
    dependents: HashMap<String, HashSet<String>>,
}

impl TaskGraph {
    /// Create a new graph builder.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Build a strict chain over `keys`: each key depends on the one before.
    ///
    /// Empty input yields an empty graph.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a key appears twice.
    pub fn chain<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = GraphBuilder::new();
        let mut previous: Option<String> = None;

        for key in keys {
            let key = key.into();
            let depends_on = previous.iter().cloned().collect();
            builder = builder.add_vertex(Vertex::Task(key.clone()), depends_on);
            previous = Some(key);
        }

        builder.build()
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Get the direct dependencies of a vertex.
    pub fn dependencies_of(&self, id: &str) -> Option<&HashSet<String>> {
        self.dependencies.get(id)
    }

    /// Get vertices that depend on the given vertex.
    pub fn dependents_of(&self, id: &str) -> Option<&HashSet<String>> {
        self.dependents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check if a vertex is ready to run given completed vertices.
    pub fn is_ready(&self, id: &str, completed: &HashSet<String>) -> bool {
        match self.dependencies.get(id) {
            None => true,
            Some(deps) => deps.iter().all(|d| completed.contains(d)),
        }
    }

    /// Returns layers of vertices that can execute in parallel.
    ///
    /// Each layer contains vertices whose dependencies are satisfied by all
    /// previous layers. Within a layer, vertices keep insertion order.
    pub fn parallel_layers(&self) -> Result<Vec<Vec<String>>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(TaskChainError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut layers: Vec<Vec<String>> = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();

        while completed.len() < self.vertices.len() {
            let ready: Vec<String> = self
                .vertices
                .keys()
                .filter(|id| !completed.contains(*id))
                .filter(|id| self.is_ready(id, &completed))
                .cloned()
                .collect();

            if ready.is_empty() {
                break;
            }

            completed.extend(ready.iter().cloned());
            layers.push(ready);
        }

        Ok(layers)
    }

    /// Returns vertex ids in topological order (dependencies first).
    pub fn topological_order(&self) -> Result<Vec<String>> {
        Ok(self.parallel_layers()?.into_iter().flatten().collect())
    }

    /// Every task key in the graph, in topological order.
    pub fn task_keys(&self) -> Vec<String> {
        let order = self
            .topological_order()
            .unwrap_or_else(|_| self.vertices.keys().cloned().collect());

        order
            .iter()
            .filter_map(|id| self.vertices.get(id))
            .flat_map(Vertex::task_keys)
            .collect()
    }

    /// Find a cycle in the graph, returning the path if one exists.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a TaskGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node.to_string());

            if let Some(deps) = graph.dependencies.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| s == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = path[start..].to_vec();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) | None => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: HashMap<&str, State> = self
            .vertices
            .keys()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();
        let mut path: Vec<String> = Vec::new();

        for id in self.vertices.keys() {
            if state.get(id.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(id, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }
}

/// Builder for constructing a [`TaskGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    vertices: IndexMap<String, Vertex>,
    dependencies: HashMap<String, HashSet<String>>,
    duplicates: Vec<String>,
}

impl GraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with its dependencies.
    pub fn add_vertex(mut self, vertex: Vertex, depends_on: Vec<String>) -> Self {
        let id = vertex.id().to_string();
        if self.vertices.contains_key(&id) {
            self.duplicates.push(id);
            return self;
        }

        self.dependencies
            .entry(id.clone())
            .or_default()
            .extend(depends_on);
        self.vertices.insert(id, vertex);
        self
    }

    /// Build the graph.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a vertex id was added twice or a dependency
    /// references an unknown vertex.
    pub fn build(self) -> Result<TaskGraph> {
        if let Some(id) = self.duplicates.first() {
            return Err(TaskChainError::validation(format!(
                "vertex '{}' added more than once",
                id
            )));
        }

        for (id, deps) in &self.dependencies {
            for dep in deps {
                if !self.vertices.contains_key(dep) {
                    return Err(TaskChainError::validation(format!(
                        "vertex '{}' depends on unknown vertex '{}'",
                        id, dep
                    )));
                }
            }
        }

        let mut dependents: HashMap<String, HashSet<String>> = self
            .vertices
            .keys()
            .map(|id| (id.clone(), HashSet::new()))
            .collect();

        for (id, deps) in &self.dependencies {
            for dep in deps {
                if let Some(set) = dependents.get_mut(dep) {
                    set.insert(id.clone());
                }
            }
        }

        Ok(TaskGraph {
            vertices: self.vertices,
            dependencies: self.dependencies,
            dependents,
        })
    }
}

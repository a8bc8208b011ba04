//! Execution of plan files.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{validate, Plan, RunConfig};
use crate::context::RunId;
use crate::error::{ErrorKind, Result, TaskChainError};
use crate::shell::shell_task;
use crate::task::{TaskHandle, TaskSummary};

use super::engine::{Engine, TaskSpec};
use super::processor::Processor;

/// Outcome of one run of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub label: String,
    pub run_id: String,
    pub tasks: Vec<TaskSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Registers a plan's tasks and groups with an [`Engine`] and runs it.
#[derive(Debug)]
pub struct PlanRunner {
    engine: Engine,
    plan: Plan,
    tasks: IndexMap<String, TaskHandle>,
}

impl PlanRunner {
    /// Validate `plan` and register its tasks and groups.
    ///
    /// Shell commands run in `cwd` when given.
    pub fn new(engine: Engine, plan: Plan, cwd: Option<PathBuf>) -> Result<Self> {
        validate(&plan)?;

        let mut tasks = IndexMap::new();
        for (name, config) in &plan.tasks {
            let handle = engine.register_definition(shell_task(name, config, cwd.clone())?)?;
            tasks.insert(name.clone(), handle);
        }

        for (group, members) in &plan.groups {
            let binder = engine.create_group(group)?;
            for member in members {
                binder.add(lookup(&tasks, member)?)?;
            }
        }

        debug!(
            "plan registered: {} task(s), {} group(s)",
            tasks.len(),
            plan.groups.len()
        );

        Ok(Self {
            engine,
            plan,
            tasks,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Execute every run in order.
    ///
    /// `run_id` overrides the id of task-list runs; with more than one run
    /// each gets the run's position appended. Stops after the first failed
    /// run. When the parallel processor is selected and every run is a
    /// distinct group, the groups run side by side.
    pub fn run_all(&self, run_id: Option<&str>) -> Vec<RunOutcome> {
        if self.groups_can_run_together() {
            return self.run_groups_together();
        }

        let many = self.plan.runs.len() > 1;
        let mut outcomes = Vec::new();

        for (index, run) in self.plan.runs.iter().enumerate() {
            let override_id = run_id.map(|id| {
                if many {
                    format!("{}_{}", id, index + 1)
                } else {
                    id.to_string()
                }
            });

            let outcome = self.run_one(index, run, override_id.as_deref());
            let failed = !outcome.succeeded();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }

        outcomes
    }

    /// Execute a single run.
    pub fn run_one(&self, index: usize, run: &RunConfig, run_id: Option<&str>) -> RunOutcome {
        let label = run.label(index);

        let run_id = match &run.group {
            Some(group) => group.clone(),
            None => match run_id.or(run.run_id.as_deref()) {
                Some(id) => id.to_string(),
                None => match RunId::generate() {
                    Ok(id) => id.to_string(),
                    Err(e) => return failed_outcome(label, String::new(), &e),
                },
            },
        };

        let result = match &run.group {
            Some(group) => self.engine.run_group(group, run.params.clone()),
            None => self
                .specs(run)
                .and_then(|specs| self.engine.run_tasks(specs, Some(&run_id))),
        };

        match result.and_then(|_| self.summaries(&run_id)) {
            Ok(tasks) => RunOutcome {
                tasks,
                label,
                run_id,
                error: None,
            },
            Err(e) => {
                warn!("{} failed: {}", label, e);
                let mut outcome = failed_outcome(label, run_id, &e);
                outcome.tasks = self.recorded_summaries(&outcome.run_id);
                outcome
            }
        }
    }

    fn specs(&self, run: &RunConfig) -> Result<Vec<TaskSpec>> {
        run.tasks
            .iter()
            .map(|spec| -> Result<TaskSpec> {
                let task = lookup(&self.tasks, &spec.task)?;
                Ok(TaskSpec::new(task, spec.params.clone()))
            })
            .collect()
    }

    fn groups_can_run_together(&self) -> bool {
        if !matches!(self.engine.processor(), Processor::MultiThread { .. }) {
            return false;
        }
        if self.plan.runs.len() < 2 {
            return false;
        }

        let mut seen = HashSet::new();
        self.plan
            .runs
            .iter()
            .all(|run| run.group.as_ref().is_some_and(|g| seen.insert(g.clone())))
    }

    fn run_groups_together(&self) -> Vec<RunOutcome> {
        let groups: Vec<(String, Vec<_>)> = self
            .plan
            .runs
            .iter()
            .filter_map(|run| run.group.clone().map(|g| (g, run.params.clone())))
            .collect();

        let error = self.engine.run_groups(groups.clone()).err();
        if let Some(e) = &error {
            warn!("group runs failed: {}", e);
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(index, (group, _))| {
                let tasks = self.recorded_summaries(&group);
                let finished = !tasks.is_empty()
                    && tasks.iter().all(|t| t.result.is_some());
                RunOutcome {
                    label: self.plan.runs[index].label(index),
                    error: match &error {
                        Some(e) if !finished => Some(e.to_string()),
                        _ => None,
                    },
                    run_id: group,
                    tasks,
                }
            })
            .collect()
    }

    fn summaries(&self, run_id: &str) -> Result<Vec<TaskSummary>> {
        let run = self.engine.get_run(run_id)?;
        Ok(run.iter().map(|(_, t)| t.summary()).collect())
    }

    /// Summaries of whatever a failed run recorded.
    ///
    /// A run that failed before it was stored has nothing to report.
    fn recorded_summaries(&self, run_id: &str) -> Vec<TaskSummary> {
        match self.summaries(run_id) {
            Ok(tasks) => tasks,
            Err(e) if e.kind() == ErrorKind::Lookup => {
                debug!("no tasks recorded for run '{}'", run_id);
                Vec::new()
            }
            Err(e) => {
                warn!("could not read results of run '{}': {}", run_id, e);
                Vec::new()
            }
        }
    }
}

fn lookup<'a>(tasks: &'a IndexMap<String, TaskHandle>, name: &str) -> Result<&'a TaskHandle> {
    tasks
        .get(name)
        .ok_or_else(|| TaskChainError::not_found("Task", name))
}

fn failed_outcome(label: String, run_id: String, error: &TaskChainError) -> RunOutcome {
    RunOutcome {
        label,
        run_id,
        tasks: Vec::new(),
        error: Some(error.to_string()),
    }
}

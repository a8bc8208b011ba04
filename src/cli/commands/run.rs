//! Run command implementation.
//!
//! `taskchain run <plan>` registers the plan's tasks and groups, executes
//! every run and prints the recorded results.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cli::args::RunArgs;
use crate::config::validate_plan;
use crate::error::{Result, TaskChainError};
use crate::runner::{Engine, PlanRunner, Processor, RunOutcome};
use crate::task::TaskSummary;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::load_plan_or_report;

/// The run command implementation.
pub struct RunCommand {
    working_dir: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(working_dir: &Path, args: RunArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn plan_path(&self) -> PathBuf {
        self.working_dir.join(&self.args.plan)
    }

    fn processor(&self, configured: Processor, default_workers: usize) -> Processor {
        let workers = self.args.workers;
        match configured {
            Processor::Sequential if !self.args.parallel => Processor::Sequential,
            Processor::MultiThread { workers: w } => Processor::MultiThread {
                workers: workers.unwrap_or(w).max(1),
            },
            Processor::Sequential => Processor::MultiThread {
                workers: workers.unwrap_or(default_workers).max(1),
            },
        }
    }

    fn show_outcome(&self, outcome: &RunOutcome, ui: &mut dyn UserInterface) {
        ui.show_header(&format!("{} ({})", outcome.label, outcome.run_id));

        for task in &outcome.tasks {
            ui.message(&task_line(task));
            if let Some(output) = task.result.as_ref().and_then(stdout_of) {
                for line in output.lines() {
                    ui.message(&format!("      {}", line));
                }
            }
        }

        match &outcome.error {
            Some(e) => ui.error(&format!("{} failed: {}", outcome.label, e)),
            None => ui.success(&format!(
                "{} finished ({} task(s))",
                outcome.label,
                outcome.tasks.len()
            )),
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.plan_path();
        let Some(plan) = load_plan_or_report(&path, ui)? else {
            return Ok(CommandResult::failure(2));
        };

        let errors = validate_plan(&plan);
        if !errors.is_empty() {
            for error in &errors {
                ui.error(&error.message);
            }
            return Ok(CommandResult::failure(1));
        }

        if plan.runs.is_empty() {
            ui.warning("Plan has no runs");
            return Ok(CommandResult::success());
        }

        let processor = self.processor(plan.settings.processor(), plan.settings.workers);
        let engine = Engine::new().with_processor(processor);
        let cwd = path.parent().map(Path::to_path_buf);
        let runner = PlanRunner::new(engine, plan, cwd)?;

        let outcomes = runner.run_all(self.args.run_id.as_deref());

        if self.args.json {
            let text =
                serde_json::to_string_pretty(&outcomes).map_err(|e| TaskChainError::Internal {
                    message: format!("failed to serialize results: {}", e),
                })?;
            ui.raw(&text);
        } else {
            for outcome in &outcomes {
                self.show_outcome(outcome, ui);
            }
        }

        if outcomes.iter().all(RunOutcome::succeeded) {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

fn task_line(task: &TaskSummary) -> String {
    let timing = task
        .duration_ms
        .map(|ms| format!(" ({}ms)", ms))
        .unwrap_or_default();
    format!("  {:<12} {} [{}]{}", task.task_key, task.title, task.state, timing)
}

fn stdout_of(result: &Value) -> Option<&str> {
    result
        .get("stdout")
        .and_then(Value::as_str)
        .map(str::trim_end)
        .filter(|s| !s.is_empty())
}

//! List command implementation.
//!
//! `taskchain list <plan>` shows the tasks, groups and runs of a plan.

use std::path::{Path, PathBuf};

use crate::cli::args::PlanArgs;
use crate::config::RunConfig;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::load_plan_or_report;

/// The list command implementation.
pub struct ListCommand {
    working_dir: PathBuf,
    args: PlanArgs,
}

impl ListCommand {
    pub fn new(working_dir: &Path, args: PlanArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.working_dir.join(&self.args.plan);
        let Some(plan) = load_plan_or_report(&path, ui)? else {
            return Ok(CommandResult::failure(2));
        };

        ui.message("  Tasks:");
        for (name, task) in &plan.tasks {
            let title = task
                .title
                .as_deref()
                .map(|t| format!(" [{}]", t))
                .unwrap_or_default();
            ui.message(&format!("    {}{} - {}", name, title, task.command));
        }

        if !plan.groups.is_empty() {
            ui.message("");
            ui.message("  Groups:");
            for (name, members) in &plan.groups {
                ui.message(&format!("    {}: {}", name, members.join(" -> ")));
            }
        }

        if !plan.runs.is_empty() {
            ui.message("");
            ui.message("  Runs:");
            for (index, run) in plan.runs.iter().enumerate() {
                ui.message(&format!("    {}", describe_run(index, run)));
            }
        }

        Ok(CommandResult::success())
    }
}

fn describe_run(index: usize, run: &RunConfig) -> String {
    match &run.group {
        Some(_) => run.label(index),
        None => {
            let names: Vec<&str> = run.tasks.iter().map(|t| t.task.as_str()).collect();
            let id = run
                .run_id
                .as_deref()
                .map(|id| format!(" ({})", id))
                .unwrap_or_default();
            format!("{}{}: {}", run.label(index), id, names.join(" -> "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_everything() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("plan.yml"),
            r#"
tasks:
  fetch:
    title: "Fetch {fn_seq_id}"
    command: curl example.com
  parse:
    command: jq .
groups:
  etl: [fetch, parse]
runs:
  - run_id: daily
    tasks: [{task: fetch}, {task: parse}]
  - group: etl
"#,
        )
        .unwrap();

        let mut ui = MockUI::new();
        let result = ListCommand::new(
            temp.path(),
            PlanArgs {
                plan: PathBuf::from("plan.yml"),
            },
        )
        .execute(&mut ui)
        .unwrap();

        assert!(result.success);
        assert!(ui.has_message("fetch [Fetch {fn_seq_id}] - curl example.com"));
        assert!(ui.has_message("etl: fetch -> parse"));
        assert!(ui.has_message("run #1 (daily): fetch -> parse"));
        assert!(ui.has_message("group 'etl'"));
    }
}

//! Validate command implementation.
//!
//! `taskchain validate <plan>` checks a plan without running anything.

use std::path::{Path, PathBuf};

use crate::cli::args::PlanArgs;
use crate::config::validate_plan;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::load_plan_or_report;

/// The validate command implementation.
pub struct ValidateCommand {
    working_dir: PathBuf,
    args: PlanArgs,
}

impl ValidateCommand {
    pub fn new(working_dir: &Path, args: PlanArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = self.working_dir.join(&self.args.plan);
        let Some(plan) = load_plan_or_report(&path, ui)? else {
            return Ok(CommandResult::failure(2));
        };

        let errors = validate_plan(&plan);
        if errors.is_empty() {
            ui.success(&format!(
                "Plan is valid: {} task(s), {} group(s), {} run(s)",
                plan.tasks.len(),
                plan.groups.len(),
                plan.runs.len()
            ));
            return Ok(CommandResult::success());
        }

        for error in &errors {
            ui.error(&format!("[{}] {}", error.rule, error.message));
        }
        ui.message(&format!("{} problem(s) found", errors.len()));
        Ok(CommandResult::failure(1))
    }
}

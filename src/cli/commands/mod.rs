//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`].

pub mod dispatcher;
pub mod list;
pub mod run;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

use std::path::Path;

use crate::config::{load_plan_file, Plan};
use crate::error::{Result, TaskChainError};
use crate::ui::UserInterface;

/// Load a plan, reporting the usual failures through `ui`.
///
/// Returns `Ok(None)` once the failure has been reported.
pub(crate) fn load_plan_or_report(path: &Path, ui: &mut dyn UserInterface) -> Result<Option<Plan>> {
    match load_plan_file(path) {
        Ok(plan) => Ok(Some(plan)),
        Err(TaskChainError::PlanNotFound { path }) => {
            ui.error(&format!("Plan not found: {}", path.display()));
            Ok(None)
        }
        Err(TaskChainError::PlanParse { path, message }) => {
            ui.error(&format!("Parse error in {}: {}", path.display(), message));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

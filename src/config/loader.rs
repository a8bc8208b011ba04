//! Plan file loading.

use std::fs;
use std::path::Path;

use crate::config::schema::Plan;
use crate::error::{Result, TaskChainError};

/// Load a plan file from disk.
///
/// # Errors
///
/// Returns `PlanNotFound` if the file does not exist and `PlanParse` if it
/// is not a valid plan.
pub fn load_plan_file(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TaskChainError::PlanNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TaskChainError::Io(e)
        }
    })?;

    parse_plan(&content, path)
}

/// Parse YAML content into a [`Plan`].
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_plan(content: &str, source_path: &Path) -> Result<Plan> {
    serde_yaml::from_str(content).map_err(|e| TaskChainError::PlanParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

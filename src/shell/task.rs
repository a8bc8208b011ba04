//! Task definitions backed by shell commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::bail;
use serde_json::Value;
use tracing::debug;

use crate::config::TaskConfig;
use crate::error::Result;
use crate::task::{strip_meta, Params, TaskDefinition};

use super::command::{execute, CommandOptions};

/// Prefix of the environment variables carrying task parameters.
pub const PARAM_ENV_PREFIX: &str = "TASKCHAIN_PARAM_";

/// Build a task definition that runs `config.command` through the shell.
///
/// Parameters are exported as `TASKCHAIN_PARAM_<NAME>` (upper-cased, with
/// non-alphanumerics mapped to `_`), next to `TASKCHAIN_RUN_ID` and
/// `TASKCHAIN_STEP`. The task result is `{exit_code, stdout, stderr}`; a
/// non-zero exit fails the task.
pub fn shell_task(
    name: &str,
    config: &TaskConfig,
    cwd: Option<PathBuf>,
) -> Result<TaskDefinition> {
    let command = config.command.clone();
    let base_env = config.env.clone();
    let title = config.title.clone().unwrap_or_default();

    TaskDefinition::new(name, title, move |params, scope| {
        let mut env = base_env.clone();
        env.insert("TASKCHAIN_RUN_ID".to_string(), scope.run_id().to_string());
        env.insert("TASKCHAIN_STEP".to_string(), scope.current_step().to_string());
        env.extend(param_env(&strip_meta(params)));

        let options = CommandOptions {
            cwd: cwd.clone(),
            env,
        };

        debug!("{}: sh -c {:?}", scope.task_key(), command);
        let result = execute(&command, &options)?;

        if !result.success {
            let code = result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = result.stderr.trim();
            if stderr.is_empty() {
                bail!("command '{}' failed with exit code {}", command, code);
            }
            bail!(
                "command '{}' failed with exit code {}: {}",
                command,
                code,
                stderr
            );
        }

        Ok(serde_json::to_value(&result)?)
    })
}

/// Environment variables exported for a parameter bag.
pub fn param_env(params: &Params) -> HashMap<String, String> {
    params
        .iter()
        .map(|(key, value)| {
            let name: String = key
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect();
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (format!("{}{}", PARAM_ENV_PREFIX, name), value)
        })
        .collect()
}

//! Shell command execution and shell-backed tasks.

pub mod command;
pub mod task;

pub use command::{execute, shell, CommandOptions, CommandResult};
pub use task::{param_env, shell_task, PARAM_ENV_PREFIX};

//! Plan validation rules.
//!
//! - Tasks must have a command and a well-formed title template
//! - Groups must reference existing tasks
//! - Runs name either a task list or a group, never both
//! - Parameters may not use the reserved `_META_` name

use crate::config::schema::Plan;
use crate::error::{Result, TaskChainError};
use crate::task::title::{extract_placeholders, is_template, PLACEHOLDERS};
use crate::task::META_KEY;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
        }
    }
}

/// Validate a plan and return all errors.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_plan(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_tasks(plan));
    errors.extend(validate_groups(plan));
    errors.extend(validate_runs(plan));

    errors
}

fn validate_tasks(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, task) in &plan.tasks {
        if task.command.trim().is_empty() {
            errors.push(ValidationError::new(
                "missing-command",
                format!("Task '{}' must have a 'command'", name),
            ));
        }

        let Some(title) = task.title.as_deref().filter(|t| is_template(t)) else {
            continue;
        };
        match extract_placeholders(title) {
            Ok(names) => {
                let mut unknown: Vec<_> = names
                    .iter()
                    .filter(|n| !PLACEHOLDERS.contains(&n.as_str()))
                    .collect();
                unknown.sort();
                for placeholder in unknown {
                    errors.push(ValidationError::new(
                        "unknown-placeholder",
                        format!(
                            "Task '{}' title uses unknown placeholder '{{{}}}'",
                            name, placeholder
                        ),
                    ));
                }
            }
            Err(e) => errors.push(ValidationError::new(
                "invalid-title",
                format!("Task '{}': {}", name, e),
            )),
        }
    }

    errors
}

fn validate_groups(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, members) in &plan.groups {
        if members.is_empty() {
            errors.push(ValidationError::new(
                "empty-group",
                format!("Group '{}' has no tasks", name),
            ));
        }

        for member in members {
            if !plan.tasks.contains_key(member) {
                errors.push(ValidationError::new(
                    "unknown-group-task",
                    format!(
                        "Group '{}' references task '{}' which does not exist",
                        name, member
                    ),
                ));
            }
        }
    }

    errors
}

fn validate_runs(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (index, run) in plan.runs.iter().enumerate() {
        let label = run.label(index);

        match (&run.group, run.tasks.is_empty()) {
            (Some(_), false) => errors.push(ValidationError::new(
                "ambiguous-run",
                format!("{} lists both 'group' and 'tasks'", label),
            )),
            (None, true) => errors.push(ValidationError::new(
                "empty-run",
                format!("{} lists no tasks", label),
            )),
            (Some(group), true) if !plan.groups.contains_key(group) => {
                errors.push(ValidationError::new(
                    "unknown-group",
                    format!("{} references a group which does not exist", label),
                ))
            }
            _ => {}
        }

        for spec in &run.tasks {
            if !plan.tasks.contains_key(&spec.task) {
                errors.push(ValidationError::new(
                    "unknown-run-task",
                    format!(
                        "{} references task '{}' which does not exist",
                        label, spec.task
                    ),
                ));
            }
        }

        let reserved = run
            .tasks
            .iter()
            .map(|spec| &spec.params)
            .chain(run.params.iter())
            .any(|params| params.contains_key(META_KEY));
        if reserved {
            errors.push(ValidationError::new(
                "reserved-param",
                format!("{} uses the reserved parameter '{}'", label, META_KEY),
            ));
        }

        if run.group.is_some() && run.run_id.is_some() {
            errors.push(ValidationError::new(
                "group-run-id",
                format!("{} runs under the group name; drop its 'run_id'", label),
            ));
        }

        if run.run_id.as_deref().is_some_and(str::is_empty) {
            errors.push(ValidationError::new(
                "empty-run-id",
                format!("{} has an empty 'run_id'", label),
            ));
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `Validation` listing every failed rule.
pub fn validate(plan: &Plan) -> Result<()> {
    let errors = validate_plan(plan);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(TaskChainError::validation(messages.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RunConfig, RunTaskConfig, TaskConfig};
    use crate::task::Params;
    use serde_json::json;

    fn task(command: &str) -> TaskConfig {
        TaskConfig {
            command: command.to_string(),
            ..Default::default()
        }
    }

    fn plan_with_task() -> Plan {
        let mut plan = Plan::default();
        plan.tasks.insert("hello".into(), task("echo hi"));
        plan
    }

    fn run_of(names: &[&str]) -> RunConfig {
        RunConfig {
            tasks: names
                .iter()
                .map(|n| RunTaskConfig {
                    task: n.to_string(),
                    params: Params::new(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_plan_passes() {
        let mut plan = plan_with_task();
        plan.groups.insert("g".into(), vec!["hello".into()]);
        plan.runs.push(run_of(&["hello"]));
        plan.runs.push(RunConfig {
            group: Some("g".into()),
            ..Default::default()
        });

        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn flags_missing_command() {
        let mut plan = Plan::default();
        plan.tasks.insert("empty".into(), task(""));

        let errors = validate_plan(&plan);
        assert!(errors.iter().any(|e| e.rule == "missing-command"));
    }

    #[test]
    fn flags_bad_title() {
        let mut plan = Plan::default();
        plan.tasks.insert(
            "t".into(),
            TaskConfig {
                title: Some("oops {fn_name}}".into()),
                command: "true".into(),
                ..Default::default()
            },
        );
        plan.tasks.insert(
            "u".into(),
            TaskConfig {
                title: Some("{fn_bogus}".into()),
                command: "true".into(),
                ..Default::default()
            },
        );

        let rules: Vec<_> = validate_plan(&plan).into_iter().map(|e| e.rule).collect();
        assert!(rules.contains(&"invalid-title".to_string()));
        assert!(rules.contains(&"unknown-placeholder".to_string()));
    }

    #[test]
    fn flags_unknown_references() {
        let mut plan = plan_with_task();
        plan.groups.insert("g".into(), vec!["missing".into()]);
        plan.runs.push(run_of(&["other"]));
        plan.runs.push(RunConfig {
            group: Some("nope".into()),
            ..Default::default()
        });

        let rules: Vec<_> = validate_plan(&plan).into_iter().map(|e| e.rule).collect();
        assert!(rules.contains(&"unknown-group-task".to_string()));
        assert!(rules.contains(&"unknown-run-task".to_string()));
        assert!(rules.contains(&"unknown-group".to_string()));
    }

    #[test]
    fn flags_ambiguous_and_empty_runs() {
        let mut plan = plan_with_task();
        plan.groups.insert("g".into(), vec!["hello".into()]);
        let mut both = run_of(&["hello"]);
        both.group = Some("g".into());
        plan.runs.push(both);
        plan.runs.push(RunConfig::default());

        let rules: Vec<_> = validate_plan(&plan).into_iter().map(|e| e.rule).collect();
        assert!(rules.contains(&"ambiguous-run".to_string()));
        assert!(rules.contains(&"empty-run".to_string()));
    }

    #[test]
    fn flags_reserved_parameter() {
        let mut plan = plan_with_task();
        let mut run = run_of(&["hello"]);
        run.tasks[0]
            .params
            .insert(META_KEY.to_string(), json!({}));
        plan.runs.push(run);

        let err = validate(&plan).unwrap_err();
        assert!(err.to_string().contains(META_KEY));
    }
}

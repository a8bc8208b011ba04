//! Title templates.
//!
//! A task title containing both `{` and `}` is a template. Placeholders are
//! resolved once, the first time the task instance executes.
//!
//! # Syntax
//!
//! - `{fn_task_key}` - the instance's task key (`seq_id[.run_id]`)
//! - `{fn_name}` - the registered task identity
//! - `{fn_run_id}` - the run id (may be empty)
//! - `{fn_seq_id}` - the sequence id
//! - `{{` and `}}` - literal braces
//!
//! # Example
//!
//! ```text
//! title: "fetch-{fn_task_key}"
//! # At step 0 of run "abc", produces: fetch-0.abc
//! ```

use crate::error::{Result, TaskChainError};
use std::collections::HashSet;

/// Placeholder names a title template may reference.
pub const PLACEHOLDERS: [&str; 4] = ["fn_task_key", "fn_name", "fn_run_id", "fn_seq_id"];

/// A segment of a title template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder reference: {name}
    Placeholder(String),
}

/// Check whether a title should be treated as a template.
pub fn is_template(title: &str) -> bool {
    title.contains('{') && title.contains('}')
}

/// Parse a title template into segments.
///
/// # Errors
///
/// Returns `InvalidTitle` for an unclosed `{`, a stray `}` or an empty `{}`.
pub fn parse_template(title: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut chars = title.chars().peekable();
    let mut current_literal = String::new();

    let invalid = |message: &str| TaskChainError::InvalidTitle {
        title: title.to_string(),
        message: message.to_string(),
    };

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                current_literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                current_literal.push('}');
            }
            '{' => {
                if !current_literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                }

                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if !closed {
                    return Err(invalid("unclosed '{'"));
                }
                if name.is_empty() {
                    return Err(invalid("empty placeholder '{}'"));
                }

                segments.push(Segment::Placeholder(name));
            }
            '}' => return Err(invalid("single '}' encountered")),
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    Ok(segments)
}

/// Extract the unique placeholder names used by a title.
pub fn extract_placeholders(title: &str) -> Result<HashSet<String>> {
    Ok(parse_template(title)?
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Placeholder(name) => Some(name),
            _ => None,
        })
        .collect())
}

/// Values available to a title template.
#[derive(Debug, Clone, Copy)]
pub struct TitleVars<'a> {
    pub task_key: &'a str,
    pub name: &'a str,
    pub run_id: &'a str,
    pub seq_id: &'a str,
}

impl TitleVars<'_> {
    /// Resolve a placeholder name to its value.
    pub fn resolve(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "fn_task_key" => Some(self.task_key),
            "fn_name" => Some(self.name),
            "fn_run_id" => Some(self.run_id),
            "fn_seq_id" => Some(self.seq_id),
            _ => None,
        }
    }
}

/// Render a title template.
///
/// # Errors
///
/// Returns `UnknownPlaceholder` if the title references a name outside
/// [`PLACEHOLDERS`], or `InvalidTitle` if it cannot be parsed.
pub fn render_title(title: &str, vars: &TitleVars<'_>) -> Result<String> {
    let mut result = String::with_capacity(title.len());

    for segment in parse_template(title)? {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder(name) => {
                let value =
                    vars.resolve(&name)
                        .ok_or_else(|| TaskChainError::UnknownPlaceholder {
                            placeholder: name.clone(),
                            title: title.to_string(),
                        })?;
                result.push_str(value);
            }
        }
    }

    Ok(result)
}

//! Run metadata injected into every task invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Params;

/// Reserved parameter name carrying [`RunMeta`] into a task body.
///
/// User parameters may not use this name.
pub const META_KEY: &str = "_META_";

/// Position of the executing task within its run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Identifier of the owning run.
    pub run_id: String,
    /// Sequence id of the executing step.
    pub current_step: String,
}

impl RunMeta {
    /// Create metadata for a step.
    pub fn new(run_id: impl Into<String>, current_step: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            current_step: current_step.into(),
        }
    }

    /// Read the injected metadata back out of a parameter bag.
    pub fn from_params(params: &Params) -> Option<Self> {
        params
            .get(META_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Render as the JSON object stored under [`META_KEY`].
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "run_id": self.run_id,
            "current_step": self.current_step,
        })
    }
}

/// Remove the injected metadata from a parameter bag, returning what is left.
pub fn strip_meta(mut params: Params) -> Params {
    params.remove(META_KEY);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_value_has_both_fields() {
        let meta = RunMeta::new("run_1", "0");
        assert_eq!(
            meta.to_value(),
            json!({"run_id": "run_1", "current_step": "0"})
        );
    }

    #[test]
    fn from_params_reads_injected_meta() {
        let mut params = Params::new();
        params.insert(META_KEY.to_string(), RunMeta::new("r", "3").to_value());

        let meta = RunMeta::from_params(&params).unwrap();
        assert_eq!(meta.run_id, "r");
        assert_eq!(meta.current_step, "3");
    }

    #[test]
    fn from_params_none_without_meta() {
        assert!(RunMeta::from_params(&Params::new()).is_none());
    }

    #[test]
    fn strip_meta_keeps_user_params() {
        let mut params = Params::new();
        params.insert("a".to_string(), json!(12));
        params.insert(META_KEY.to_string(), json!({}));

        let stripped = strip_meta(params);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.get("a"), Some(&json!(12)));
    }
}

//! Run ID generation.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::{Result, TaskChainError};

/// A generated run identifier.
///
/// Format: `run_{timestamp_ms}_{random_hex}`. Contains no `.`, so it can sit
/// behind the sequence id in a task key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    timestamp: DateTime<Utc>,
    random: [u8; 8],
}

impl RunId {
    /// Generate a new run ID.
    pub fn generate() -> Result<Self> {
        let mut random = [0u8; 8];
        getrandom::getrandom(&mut random).map_err(|e| TaskChainError::Internal {
            message: format!("failed to generate random bytes: {}", e),
        })?;

        // Truncate to milliseconds for consistent formatting
        let now = Utc::now();
        let timestamp = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        Ok(Self { timestamp, random })
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_{}_{}",
            self.timestamp.timestamp_millis(),
            hex::encode(self.random)
        )
    }
}

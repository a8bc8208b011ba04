//! Engine state: run contexts and the context store that owns them.
//!
//! - [`RunContext`] - ordered step key to task instance map for one run
//! - [`ContextStore`] - title, group and run partitions behind one handle
//! - [`RunId`] - generated identifiers for runs without an explicit id

pub mod run_context;
pub mod run_id;
pub mod store;

pub use run_context::RunContext;
pub use run_id::RunId;
pub use store::{
    ContextStore, Entity, GroupBinder, GroupBinding, Partition, PartitionEntry, RunBinding,
    TitleBinding,
};

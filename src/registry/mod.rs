//! Registration data: task titles and task groups.
//!
//! Both registries live inside the [`ContextStore`](crate::context::ContextStore)
//! and are reached through it.

pub mod groups;
pub mod titles;

pub use groups::GroupRegistry;
pub use titles::TitleRegistry;

//! Build orchestration on top of a resolved config.
//!
//! - [`plan`]: the [`BuildPlan`](plan::BuildPlan) read from well-known keys.
//! - [`setters`]: the capability table that routes every other key to a
//!   toolchain setting.
//! - [`tasks`]: the priority-ordered pre-build task list.
//! - [`session`]: the standard build run tying the three to a
//!   [`BuildToolchain`](session::BuildToolchain).

pub mod plan;
pub mod session;
pub mod setters;
pub mod tasks;

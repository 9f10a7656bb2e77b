//! HTTP request handlers.

pub mod auth;
pub mod common;
pub mod meta;
pub mod subtasks;
pub mod tasks;

pub use auth::*;
pub use common::*;
pub use meta::*;
pub use subtasks::*;
pub use tasks::*;

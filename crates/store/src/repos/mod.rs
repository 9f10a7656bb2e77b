//! Repository traits for store operations.

pub mod sessions;
pub mod subtasks;
pub mod tasks;
pub mod users;

pub use sessions::SessionRepo;
pub use subtasks::SubtaskRepo;
pub use tasks::TaskRepo;
pub use users::UserRepo;

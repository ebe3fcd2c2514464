//! SQLite storage implementation for goals.

mod model;
mod repository;

pub(crate) use model::DATE_FORMAT;
pub use model::GoalDB;
pub use repository::GoalRepository;

//! Goals module - domain models, services, and traits.
//!
//! ```text
//! GoalService ──reads──▶ ActivityLogReaderTrait
//!      │                        │
//!      │                 ProgressCalculator
//!      │                        │
//!      ├──────────────▶ LifecycleSupervisor ──writes──▶ GoalRepositoryTrait
//!      │
//!      └── RecurringInstanceManager (template + daily instances)
//! ```

mod goals_cache;
mod goals_errors;
mod goals_model;
mod goals_service;
mod goals_traits;
mod lifecycle;
mod progress_calculator;
mod recurring;


pub use goals_cache::InMemoryGoalCache;
pub use goals_errors::GoalError;
pub use goals_model::{
    DateWindow, Goal, GoalFilters, GoalKind, GoalStatus, GoalType, GoalUpdate, NewGoal,
    ProgressUpdate, RolloverResult, SpawnedRecurringGoal, SweepResult,
};
pub use goals_service::GoalService;
pub use goals_traits::{GoalCacheTrait, GoalRepositoryTrait, GoalServiceTrait};
pub use lifecycle::LifecycleSupervisor;
pub use progress_calculator::ProgressCalculator;
pub use recurring::RecurringInstanceManager;

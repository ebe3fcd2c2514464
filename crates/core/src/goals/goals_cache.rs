use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::goals_model::Goal;
use super::goals_traits::GoalCacheTrait;

struct CachedGoals {
    goals: Vec<Goal>,
    cached_at: Instant,
}

/// In-process listing cache with a fixed time-to-live.
pub struct InMemoryGoalCache {
    entries: DashMap<String, CachedGoals>,
    ttl: Duration,
}

impl InMemoryGoalCache {
    pub fn new(ttl: Duration) -> Self {
        InMemoryGoalCache {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GoalCacheTrait for InMemoryGoalCache {
    fn get_goals(&self, owner_id: &str) -> Option<Vec<Goal>> {
        let fresh = self
            .entries
            .get(owner_id)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.goals.clone());
        if fresh.is_none() {
            self.entries.remove(owner_id);
        }
        fresh
    }

    fn put_goals(&self, owner_id: &str, goals: Vec<Goal>) {
        self.entries.insert(
            owner_id.to_string(),
            CachedGoals {
                goals,
                cached_at: Instant::now(),
            },
        );
    }

    fn invalidate(&self, owner_id: &str) {
        self.entries.remove(owner_id);
    }
}

//! Progress calculation: maps a goal definition and an activity snapshot to a value.
//!
//! Everything here is pure. The same snapshot always yields the same value,
//! whatever order its records come in.

use std::collections::HashSet;

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::goals_model::{DateWindow, GoalFilters, GoalType};
use crate::activities::{ActivitySnapshot, SourceSet};
use crate::utils::time_utils::{local_date_from_utc, previous_day};

/// Computes goal progress from validated activity.
#[derive(Debug, Clone, Copy)]
pub struct ProgressCalculator {
    timezone: Tz,
}

impl ProgressCalculator {
    pub fn new(timezone: Tz) -> Self {
        ProgressCalculator { timezone }
    }

    /// Activity sources a goal type reads.
    pub fn required_sources(goal_type: GoalType) -> SourceSet {
        match goal_type {
            GoalType::Hours | GoalType::Questions | GoalType::Streak => SourceSet {
                sessions: true,
                ..SourceSet::NONE
            },
            GoalType::MockExams | GoalType::Performance => SourceSet {
                exams: true,
                ..SourceSet::NONE
            },
            GoalType::Topics => SourceSet {
                topics: true,
                ..SourceSet::NONE
            },
        }
    }

    /// Current value of a goal of `goal_type` over `window`.
    ///
    /// `today` is the local calendar day; only Streak looks at it.
    pub fn compute(
        &self,
        goal_type: GoalType,
        window: DateWindow,
        filters: &GoalFilters,
        snapshot: &ActivitySnapshot,
        today: NaiveDate,
    ) -> f64 {
        match goal_type {
            GoalType::Hours => hours_in_window(snapshot, window),
            GoalType::Questions => questions_in_window(snapshot, window, filters),
            GoalType::MockExams => snapshot
                .exams
                .iter()
                .filter(|e| window.contains(e.date))
                .count() as f64,
            GoalType::Topics => self.topics_in_window(snapshot, window, filters),
            GoalType::Performance => correct_answers_in_window(snapshot, window, filters),
            GoalType::Streak => current_streak(snapshot, today),
        }
    }

    fn topics_in_window(
        &self,
        snapshot: &ActivitySnapshot,
        window: DateWindow,
        filters: &GoalFilters,
    ) -> f64 {
        let topics: HashSet<&str> = snapshot
            .topics
            .iter()
            .filter(|t| t.completed)
            .filter(|t| window.contains(local_date_from_utc(t.completed_at, self.timezone)))
            // An event without incidence matches any incidence filter.
            .filter(|t| match (filters.incidence, t.incidence) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .map(|t| t.topic_id.as_str())
            .collect();
        topics.len() as f64
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn hours_in_window(snapshot: &ActivitySnapshot, window: DateWindow) -> f64 {
    let mut minutes: Vec<f64> = snapshot
        .sessions
        .iter()
        .filter(|s| window.contains(s.date))
        .map(|s| s.minutes)
        .collect();
    // Sorted so float addition does not depend on record order.
    minutes.sort_by(f64::total_cmp);
    round_one_decimal(minutes.iter().sum::<f64>() / 60.0)
}

fn subject_matches(filter: &Option<String>, subject: Option<&str>) -> bool {
    match filter.as_deref() {
        None => true,
        Some(wanted) => subject == Some(wanted),
    }
}

fn questions_in_window(
    snapshot: &ActivitySnapshot,
    window: DateWindow,
    filters: &GoalFilters,
) -> f64 {
    snapshot
        .sessions
        .iter()
        .filter(|s| window.contains(s.date))
        .filter(|s| subject_matches(&filters.subject, s.subject.as_deref()))
        .map(|s| u64::from(s.questions_attempted))
        .sum::<u64>() as f64
}

fn correct_answers_in_window(
    snapshot: &ActivitySnapshot,
    window: DateWindow,
    filters: &GoalFilters,
) -> f64 {
    snapshot
        .exams
        .iter()
        .filter(|e| window.contains(e.date))
        .map(|e| match filters.subject.as_deref() {
            Some(subject) => u64::from(e.per_subject_correct.get(subject).copied().unwrap_or(0)),
            None => u64::from(e.total_correct),
        })
        .sum::<u64>() as f64
}

/// Consecutive days with at least one session, counting back from `today`.
fn current_streak(snapshot: &ActivitySnapshot, today: NaiveDate) -> f64 {
    let days: HashSet<NaiveDate> = snapshot.sessions.iter().map(|s| s.date).collect();
    let mut streak = 0u32;
    let mut day = Some(today);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = previous_day(d);
    }
    f64::from(streak)
}

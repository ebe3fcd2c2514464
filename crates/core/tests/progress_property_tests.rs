//! Property-based integration tests for progress computation and completion.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use studygoals_core::activities::{
    ActivitySnapshot, Incidence, RawExamRecord, RawStudySession, RawTopicCompletion,
};
use studygoals_core::goals::{
    DateWindow, Goal, GoalFilters, GoalStatus, GoalType, LifecycleSupervisor, ProgressCalculator,
};
use studygoals_core::utils::time_utils::DEFAULT_STUDY_TZ;

// =============================================================================
// Generators
// =============================================================================

fn base_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Generates a session within the first 30 days of March 2024.
fn arb_session() -> impl Strategy<Value = RawStudySession> {
    (
        "[a-f0-9]{8}",
        0i64..30,
        0.0f64..240.0,
        0i64..80,
        prop_oneof![
            Just(None),
            Just(Some("matematica".to_string())),
            Just(Some("biologia".to_string())),
        ],
    )
        .prop_map(|(id, offset, minutes, attempted, subject)| RawStudySession {
            id,
            session_date: Some(base_day() + Duration::days(offset)),
            minutes: Some(minutes),
            questions_attempted: Some(attempted),
            questions_correct: Some(attempted / 2),
            subject,
        })
}

fn arb_session_log() -> impl Strategy<Value = Vec<RawStudySession>> {
    prop::collection::vec(arb_session(), 0..40)
}

fn per_subject_json(math: Option<i64>, biology: Option<i64>) -> Option<String> {
    let entries: Vec<String> = [("matematica", math), ("biologia", biology)]
        .iter()
        .filter_map(|(subject, count)| count.map(|c| format!("\"{}\": {}", subject, c)))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", entries.join(", ")))
    }
}

/// Generates a mock exam, sometimes without a per-subject breakdown.
fn arb_exam() -> impl Strategy<Value = RawExamRecord> {
    (
        "[a-f0-9]{8}",
        0i64..30,
        0i64..90,
        prop::option::of(0i64..45),
        prop::option::of(0i64..45),
    )
        .prop_map(|(id, offset, total, math, biology)| RawExamRecord {
            id,
            exam_date: Some(base_day() + Duration::days(offset)),
            total_correct: Some(total),
            per_subject_correct: per_subject_json(math, biology),
        })
}

/// Generates a topic completion at any hour, so some fall on a different
/// local day than their UTC day. Topic ids repeat to exercise de-duplication.
fn arb_topic() -> impl Strategy<Value = RawTopicCompletion> {
    (
        "[a-f0-9]{8}",
        0u8..8,
        0i64..30,
        0i64..(24 * 60),
        prop_oneof![
            Just(None),
            Just(Some("alta".to_string())),
            Just(Some("media".to_string())),
            Just(Some("baixa".to_string())),
        ],
        prop_oneof![Just(Some(true)), Just(Some(false)), Just(None)],
    )
        .prop_map(|(id, topic, offset, minute, incidence, completed)| {
            let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
            RawTopicCompletion {
                id,
                topic_id: Some(format!("topico-{}", topic)),
                completed_at: Some(midnight + Duration::days(offset) + Duration::minutes(minute)),
                incidence,
                completed,
            }
        })
}

#[derive(Debug, Clone)]
struct ActivityLog {
    sessions: Vec<RawStudySession>,
    exams: Vec<RawExamRecord>,
    topics: Vec<RawTopicCompletion>,
}

impl ActivityLog {
    fn snapshot(self) -> ActivitySnapshot {
        ActivitySnapshot::ingest(self.sessions, self.exams, self.topics)
    }
}

fn arb_activity_log() -> impl Strategy<Value = ActivityLog> {
    (
        arb_session_log(),
        prop::collection::vec(arb_exam(), 0..15),
        prop::collection::vec(arb_topic(), 0..30),
    )
        .prop_map(|(sessions, exams, topics)| ActivityLog {
            sessions,
            exams,
            topics,
        })
}

/// A log paired with a copy whose three sources are each reordered.
fn arb_log_and_reordered() -> impl Strategy<Value = (ActivityLog, ActivityLog)> {
    arb_activity_log().prop_flat_map(|log| {
        let original = log.clone();
        (
            Just(log.sessions).prop_shuffle(),
            Just(log.exams).prop_shuffle(),
            Just(log.topics).prop_shuffle(),
        )
            .prop_map(move |(sessions, exams, topics)| {
                (
                    original.clone(),
                    ActivityLog {
                        sessions,
                        exams,
                        topics,
                    },
                )
            })
    })
}

fn arb_goal_type() -> impl Strategy<Value = GoalType> {
    prop_oneof![
        Just(GoalType::Hours),
        Just(GoalType::Questions),
        Just(GoalType::MockExams),
        Just(GoalType::Topics),
        Just(GoalType::Streak),
        Just(GoalType::Performance),
    ]
}

fn arb_filters() -> impl Strategy<Value = GoalFilters> {
    (
        prop_oneof![
            Just(None),
            Just(Some("matematica".to_string())),
            Just(Some("biologia".to_string())),
        ],
        prop_oneof![
            Just(None),
            Just(Some(Incidence::High)),
            Just(Some(Incidence::Medium)),
            Just(Some(Incidence::Low)),
        ],
    )
        .prop_map(|(subject, incidence)| GoalFilters { subject, incidence })
}

fn arb_session_type() -> impl Strategy<Value = GoalType> {
    prop_oneof![
        Just(GoalType::Hours),
        Just(GoalType::Questions),
        Just(GoalType::Streak),
    ]
}

fn snapshot(sessions: Vec<RawStudySession>) -> ActivitySnapshot {
    ActivitySnapshot::ingest(sessions, Vec::new(), Vec::new())
}

fn active_goal(target: f64) -> Goal {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Goal {
        id: "g1".to_string(),
        owner_id: "student-1".to_string(),
        goal_type: GoalType::Questions,
        name: "Questões".to_string(),
        description: None,
        target_value: target,
        current_value: 0.0,
        unit: "questões".to_string(),
        recurring: false,
        parent_goal_id: None,
        reference_date: None,
        window_start: base_day(),
        window_end: base_day() + Duration::days(30),
        filter_subject: None,
        filter_incidence: None,
        status: GoalStatus::Active,
        completed_at: None,
        created_by: None,
        created_at: at,
        updated_at: at,
        version: 1,
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Reordering any activity source never changes the computed value,
    /// whatever the goal type and filters.
    #[test]
    fn prop_progress_ignores_record_order(
        (log, reordered) in arb_log_and_reordered(),
        goal_type in arb_goal_type(),
        filters in arb_filters(),
        start in 0i64..30,
        len in 0i64..30,
    ) {
        let calc = ProgressCalculator::new(DEFAULT_STUDY_TZ);
        let window_start = base_day() + Duration::days(start);
        let window = DateWindow::new(window_start, window_start + Duration::days(len));
        let today = base_day() + Duration::days(29);

        let a = calc.compute(goal_type, window, &filters, &log.snapshot(), today);
        let b = calc.compute(goal_type, window, &filters, &reordered.snapshot(), today);
        prop_assert_eq!(a, b);
    }

    /// An incidence filter can only narrow the set of completed topics.
    #[test]
    fn prop_incidence_filter_narrows(
        log in arb_activity_log(),
        incidence in prop_oneof![Just(Incidence::High), Just(Incidence::Medium), Just(Incidence::Low)],
    ) {
        let calc = ProgressCalculator::new(DEFAULT_STUDY_TZ);
        let window = DateWindow::new(base_day(), base_day() + Duration::days(29));
        let today = base_day() + Duration::days(29);
        let filtered = GoalFilters { subject: None, incidence: Some(incidence) };
        let snapshot = log.snapshot();

        let all = calc.compute(GoalType::Topics, window, &GoalFilters::default(), &snapshot, today);
        let narrowed = calc.compute(GoalType::Topics, window, &filtered, &snapshot, today);
        prop_assert!(narrowed <= all);
    }

    /// Computed values are never negative and streaks never exceed the
    /// number of distinct study days.
    #[test]
    fn prop_progress_is_bounded(
        log in arb_session_log(),
        goal_type in arb_session_type(),
        today_offset in 0i64..30,
    ) {
        let calc = ProgressCalculator::new(DEFAULT_STUDY_TZ);
        let window = DateWindow::new(base_day(), base_day() + Duration::days(29));
        let today = base_day() + Duration::days(today_offset);
        let distinct_days: HashSet<_> = log.iter().filter_map(|s| s.session_date).collect();
        let studied_today = distinct_days.contains(&today);

        let value = calc.compute(goal_type, window, &GoalFilters::default(), &snapshot(log), today);
        prop_assert!(value >= 0.0);
        if goal_type == GoalType::Streak {
            prop_assert!(value <= distinct_days.len() as f64);
            prop_assert_eq!(value == 0.0, !studied_today);
        }
    }

    /// A subject filter can only narrow the question count.
    #[test]
    fn prop_subject_filter_narrows(log in arb_session_log()) {
        let calc = ProgressCalculator::new(DEFAULT_STUDY_TZ);
        let window = DateWindow::new(base_day(), base_day() + Duration::days(29));
        let today = base_day() + Duration::days(29);
        let filtered = GoalFilters { subject: Some("matematica".to_string()), incidence: None };

        let all = calc.compute(GoalType::Questions, window, &GoalFilters::default(), &snapshot(log.clone()), today);
        let math = calc.compute(GoalType::Questions, window, &filtered, &snapshot(log), today);
        prop_assert!(math <= all);
    }

    /// An Active goal is completed exactly when its value reaches the target.
    #[test]
    fn prop_completion_matches_target(target in 0.1f64..500.0, value in 0.0f64..1000.0) {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let mut goal = active_goal(target);

        let completed = LifecycleSupervisor::apply_progress(&mut goal, value, now);
        prop_assert_eq!(completed, value >= target);
        prop_assert_eq!(goal.status == GoalStatus::Completed, value >= target);
        prop_assert_eq!(goal.completed_at.is_some(), value >= target);
    }
}

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Default timezone for study dates.
/// Activity timestamps are converted to calendar days in this timezone.
pub const DEFAULT_STUDY_TZ: Tz = chrono_tz::America::Sao_Paulo;

/// Source of the current instant.
///
/// Injected into services so time-based transitions (completion stamps,
/// expiration, streaks) can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freezes the clock at local noon of `date` in `tz`.
    pub fn at_local_noon(date: NaiveDate, tz: Tz) -> Self {
        FixedClock(local_noon(date, tz))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Converts a UTC instant to a calendar date in the given timezone.
///
/// This is the single source of truth for converting instants to study days.
pub fn local_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Returns the instant at 12:00 local time on `date`.
///
/// Noon is never skipped or repeated by DST shifts, so a date anchored here
/// survives a round trip through UTC without moving to a neighbouring day.
pub fn local_noon(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
    match tz.from_local_datetime(&noon).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&noon),
    }
}

/// The calendar day before `date`, if representable.
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_noon_round_trips_to_same_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for tz in [chrono_tz::UTC, chrono_tz::Asia::Tokyo, chrono_tz::Pacific::Honolulu] {
            assert_eq!(local_date_from_utc(local_noon(date, tz), tz), date);
        }
    }

    #[test]
    fn test_late_evening_utc_is_previous_local_day() {
        // 01:30 UTC on March 2nd is still March 1st in São Paulo (UTC-3).
        let instant = Utc.with_ymd_and_hms(2024, 3, 2, 1, 30, 0).unwrap();
        assert_eq!(
            local_date_from_utc(instant, DEFAULT_STUDY_TZ),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_previous_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            previous_day(date),
            Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }
}

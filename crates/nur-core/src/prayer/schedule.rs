//! One day's prayer schedule and the queries derived from it.
//!
//! A [`PrayerSchedule`] is immutable once built. "Current" and "next" are pure
//! functions of the schedule and a caller-supplied `now`, so the same value
//! can be queried every clock tick without re-fetching.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::Prayer;
use crate::error::ValidationError;
use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrayerSchedule {
    date: NaiveDate,
    times: [DateTime<Utc>; 5],
    hijri_date: String,
    location: Location,
}

impl PrayerSchedule {
    /// Build a schedule from timestamps in prayer order (Fajr..Isha).
    ///
    /// # Errors
    /// Returns `NonMonotonicSchedule` unless every timestamp is strictly
    /// after the previous one.
    pub fn new(
        date: NaiveDate,
        times: [DateTime<Utc>; 5],
        hijri_date: impl Into<String>,
        location: Location,
    ) -> Result<Self, ValidationError> {
        for pair in Prayer::ALL.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if times[a.index()] >= times[b.index()] {
                return Err(ValidationError::NonMonotonicSchedule {
                    date,
                    earlier: format!("{a} {}", times[a.index()].to_rfc3339()),
                    later: format!("{b} {}", times[b.index()].to_rfc3339()),
                });
            }
        }
        Ok(Self {
            date,
            times,
            hijri_date: hijri_date.into(),
            location,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hijri_date(&self) -> &str {
        &self.hijri_date
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn time_of(&self, prayer: Prayer) -> DateTime<Utc> {
        self.times[prayer.index()]
    }

    pub fn times(&self) -> &[DateTime<Utc>; 5] {
        &self.times
    }

    /// All five prayers with their times, in order.
    pub fn entries(&self) -> impl Iterator<Item = (Prayer, DateTime<Utc>)> + '_ {
        Prayer::ALL.into_iter().map(|p| (p, self.time_of(p)))
    }

    // ── Derived queries ──────────────────────────────────────────────

    /// The last prayer whose time is at or before `now`; `None` before Fajr.
    pub fn current_prayer(&self, now: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        self.entries().take_while(|(_, t)| *t <= now).last()
    }

    /// The first prayer whose time is after `now`; `None` after Isha.
    pub fn next_prayer(&self, now: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        self.entries().find(|(_, t)| *t > now)
    }

    pub fn remaining_count(&self, now: DateTime<Utc>) -> usize {
        self.times.iter().filter(|t| **t > now).count()
    }

    /// Whether the named prayer's time is at or before `now`.
    ///
    /// Unrecognized names answer `false` rather than failing; use
    /// [`has_prayer_passed`](Self::has_prayer_passed) when the prayer is
    /// already known.
    pub fn has_passed(&self, name: &str, now: DateTime<Utc>) -> bool {
        name.parse::<Prayer>()
            .map(|p| self.has_prayer_passed(p, now))
            .unwrap_or(false)
    }

    pub fn has_prayer_passed(&self, prayer: Prayer, now: DateTime<Utc>) -> bool {
        self.time_of(prayer) <= now
    }

    pub fn time_until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_prayer(now).map(|(_, t)| t - now)
    }
}

/// Human-readable countdown: "in 2 hours 34 minutes", "in 1 hour",
/// "in 45 minutes", "in less than a minute", or "now".
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let plural = |n: i64| if n > 1 { "s" } else { "" };

    match (hours, minutes) {
        (0, 0) => "in less than a minute".to_string(),
        (0, m) => format!("in {m} minute{}", plural(m)),
        (h, 0) => format!("in {h} hour{}", plural(h)),
        (h, m) => format!("in {h} hour{} {m} minute{}", plural(h), plural(m)),
    }
}

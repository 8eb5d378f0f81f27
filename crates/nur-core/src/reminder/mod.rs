//! Reminders: what should fire, when, and with which text.
//!
//! - [`ScheduledReminder`]: one concrete timed alert
//! - [`ReminderDelivery`]: the boundary that actually delivers alerts
//! - [`ReminderScheduler`]: turns a schedule plus preferences into alerts

mod delivery;
mod scheduler;

pub use delivery::{MemoryDelivery, ReminderDelivery, TaskDelivery};
pub use scheduler::{MaterializeReport, ReminderScheduler};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::prayer::Prayer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    /// `<Name>_<fire_at unix seconds>`; re-registering the same id replaces.
    pub id: String,
    pub prayer: Prayer,
    pub date: NaiveDate,
    pub prayer_time: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    pub lead_minutes: u32,
    pub title: String,
    pub body: String,
}

impl ScheduledReminder {
    pub fn new(
        prayer: Prayer,
        date: NaiveDate,
        prayer_time: DateTime<Utc>,
        lead_minutes: u32,
        user_name: &str,
    ) -> Self {
        let fire_at = prayer_time - Duration::minutes(i64::from(lead_minutes));
        Self {
            id: reminder_id(prayer, fire_at),
            prayer,
            date,
            prayer_time,
            fire_at,
            lead_minutes,
            title: reminder_title(prayer),
            body: reminder_body(prayer, lead_minutes, user_name),
        }
    }
}

pub fn reminder_id(prayer: Prayer, fire_at: DateTime<Utc>) -> String {
    format!("{}_{}", prayer.name(), fire_at.timestamp())
}

pub fn reminder_title(prayer: Prayer) -> String {
    format!("{} Prayer", prayer.name())
}

/// "Fajr prayer now" / "Fajr prayer in 10 minutes", prefixed with
/// "<user>, " when a user name is set.
pub fn reminder_body(prayer: Prayer, lead_minutes: u32, user_name: &str) -> String {
    let message = match lead_minutes {
        0 => format!("{} prayer now", prayer.name()),
        m => format!("{} prayer in {m} minutes", prayer.name()),
    };
    let user_name = user_name.trim();
    if user_name.is_empty() {
        message
    } else {
        format!("{user_name}, {message}")
    }
}

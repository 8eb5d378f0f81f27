//! Materializes reminder preferences into concrete timed alerts.
//!
//! Every materialization first cancels everything previously registered and
//! then registers the reminders for the given schedule from scratch, so no
//! alert from an older schedule or preference state can survive.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{ReminderDelivery, ScheduledReminder};
use crate::error::{CoreError, SchedulingError};
use crate::prayer::{Prayer, PrayerSchedule};
use crate::preferences::ReminderPreferences;

/// Outcome of one materialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializeReport {
    /// Reminders registered with the delivery boundary, in prayer order.
    pub scheduled: Vec<ScheduledReminder>,
    /// Prayers whose registration was rejected.
    pub failures: Vec<(Prayer, SchedulingError)>,
    /// Enabled prayers skipped because their fire time had already passed.
    pub skipped_past_due: Vec<Prayer>,
}

pub struct ReminderScheduler {
    delivery: Arc<dyn ReminderDelivery>,
    registered: BTreeMap<Prayer, String>,
}

impl ReminderScheduler {
    pub fn new(delivery: Arc<dyn ReminderDelivery>) -> Self {
        Self {
            delivery,
            registered: BTreeMap::new(),
        }
    }

    pub fn delivery(&self) -> &Arc<dyn ReminderDelivery> {
        &self.delivery
    }

    /// Ids currently registered, by prayer.
    pub fn registered(&self) -> &BTreeMap<Prayer, String> {
        &self.registered
    }

    pub fn materialize(
        &mut self,
        schedule: &PrayerSchedule,
        preferences: &ReminderPreferences,
        user_name: &str,
    ) -> Result<MaterializeReport, SchedulingError> {
        self.materialize_at(schedule, preferences, user_name, Utc::now())
    }

    /// Replace all registered reminders with the ones for `schedule`.
    ///
    /// Reminders whose fire time is at or before `now` are skipped. A failed
    /// registration is recorded in the report and does not stop the others.
    ///
    /// # Errors
    /// Fails only when the previous reminders cannot be cancelled, in which
    /// case nothing new is registered.
    pub fn materialize_at(
        &mut self,
        schedule: &PrayerSchedule,
        preferences: &ReminderPreferences,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<MaterializeReport, SchedulingError> {
        self.cancel_all()?;

        let mut report = MaterializeReport::default();
        for (prayer, time) in schedule.entries() {
            if !preferences.is_enabled(prayer) {
                continue;
            }
            let reminder = ScheduledReminder::new(
                prayer,
                schedule.date(),
                time,
                preferences.lead_minutes(prayer),
                user_name,
            );
            if reminder.fire_at <= now {
                report.skipped_past_due.push(prayer);
                continue;
            }

            match self.delivery.schedule(&reminder) {
                Ok(()) => {
                    self.registered.insert(prayer, reminder.id.clone());
                    report.scheduled.push(reminder);
                }
                Err(e) => {
                    warn!(prayer = %prayer, error = %e, "failed to register reminder");
                    report.failures.push((prayer, e));
                }
            }
        }

        info!(
            date = %schedule.date(),
            scheduled = report.scheduled.len(),
            skipped = report.skipped_past_due.len(),
            failed = report.failures.len(),
            "materialized prayer reminders"
        );
        Ok(report)
    }

    pub fn cancel_all(&mut self) -> Result<(), SchedulingError> {
        self.delivery.cancel_all()?;
        self.registered.clear();
        Ok(())
    }

    /// Cancel the reminder registered for `prayer`. Returns whether one was.
    pub fn cancel_prayer(&mut self, prayer: Prayer) -> Result<bool, SchedulingError> {
        match self.registered.get(&prayer) {
            Some(id) => {
                self.delivery.cancel(id)?;
                self.registered.remove(&prayer);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Cancel by prayer name.
    ///
    /// # Errors
    /// Unknown names are a validation error; delivery failures propagate.
    pub fn cancel(&mut self, prayer_name: &str) -> Result<bool, CoreError> {
        let prayer: Prayer = prayer_name.parse()?;
        Ok(self.cancel_prayer(prayer)?)
    }
}

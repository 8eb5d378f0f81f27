//! The single logical owner of the active schedule.
//!
//! A [`PrayerSession`] holds today's schedule and the reminder state derived
//! from it. Clock ticks drive it: a tick only causes a reload when no
//! schedule is held or the held one is for an earlier day.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Tick;
use crate::error::CoreError;
use crate::location::Location;
use crate::method::CalculationMethod;
use crate::prayer::{Prayer, PrayerSchedule};
use crate::preferences::ReminderPreferences;
use crate::provider::ScheduleProvider;
use crate::reminder::{MaterializeReport, ReminderScheduler};
use crate::storage::Config;

/// Everything a refresh depends on besides the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub location: Location,
    pub method: CalculationMethod,
    pub preferences: ReminderPreferences,
    pub user_name: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            location: config.location.clone(),
            method: config.calculation_method,
            preferences: config.reminders.clone(),
            user_name: config.user_name.clone(),
        }
    }
}

pub struct PrayerSession {
    provider: Arc<ScheduleProvider>,
    scheduler: ReminderScheduler,
    settings: SessionSettings,
    schedule: Option<PrayerSchedule>,
}

impl PrayerSession {
    pub fn new(
        provider: Arc<ScheduleProvider>,
        scheduler: ReminderScheduler,
        settings: SessionSettings,
    ) -> Self {
        Self {
            provider,
            scheduler,
            settings,
            schedule: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn schedule(&self) -> Option<&PrayerSchedule> {
        self.schedule.as_ref()
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    /// Load the schedule for the day containing `now` and reschedule
    /// reminders from it.
    ///
    /// The new schedule is held even if reminder registration then fails.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Result<MaterializeReport, CoreError> {
        let schedule = self
            .provider
            .get_today_at(now, &self.settings.location, self.settings.method)
            .await?;
        info!(date = %schedule.date(), city = %schedule.location().city, "schedule loaded");

        let schedule = self.schedule.insert(schedule);
        let report = self.scheduler.materialize_at(
            schedule,
            &self.settings.preferences,
            &self.settings.user_name,
            now,
        )?;
        Ok(report)
    }

    /// Refresh when nothing is loaded or the day rolled over.
    ///
    /// Returns `None` when the held schedule is still current.
    pub async fn on_tick(&mut self, tick: &Tick) -> Result<Option<MaterializeReport>, CoreError> {
        let stale = match &self.schedule {
            None => true,
            Some(schedule) => tick.rolled_over(schedule.date()),
        };
        if !stale {
            return Ok(None);
        }
        self.refresh(tick.now).await.map(Some)
    }

    /// Replace the settings and reschedule everything.
    ///
    /// If the new schedule cannot be loaded, the reminders registered under
    /// the old settings are withdrawn before the error is returned.
    pub async fn update_settings(
        &mut self,
        settings: SessionSettings,
        now: DateTime<Utc>,
    ) -> Result<MaterializeReport, CoreError> {
        if settings.location.has_significant_change(&self.settings.location) {
            info!(
                from = %self.settings.location.display_name(),
                to = %settings.location.display_name(),
                "location changed"
            );
        }
        self.settings = settings;
        self.schedule = None;
        let result = self.refresh(now).await;
        if result.is_err() {
            if let Err(e) = self.scheduler.cancel_all() {
                warn!(error = %e, "failed to cancel reminders after settings change");
            }
        }
        result
    }

    pub fn current_prayer(&self, now: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        self.schedule.as_ref()?.current_prayer(now)
    }

    pub fn next_prayer(&self, now: DateTime<Utc>) -> Option<(Prayer, DateTime<Utc>)> {
        self.schedule.as_ref()?.next_prayer(now)
    }

    pub fn time_until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.schedule.as_ref()?.time_until_next(now)
    }

    pub fn remaining_count(&self, now: DateTime<Utc>) -> usize {
        self.schedule
            .as_ref()
            .map_or(0, |schedule| schedule.remaining_count(now))
    }

    pub fn hijri_date(&self) -> Option<&str> {
        self.schedule.as_ref().map(PrayerSchedule::hijri_date)
    }

    /// Drive [`on_tick`](Self::on_tick) from the clock until cancelled or
    /// the clock goes away. Failed refreshes are logged and retried on the
    /// next tick.
    pub async fn run(&mut self, mut ticks: watch::Receiver<Tick>, cancel: CancellationToken) {
        loop {
            let tick = *ticks.borrow_and_update();
            if let Err(e) = self.on_tick(&tick).await {
                warn!(error = %e, "schedule refresh failed");
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("prayer session cancelled");
                    break;
                }
                changed = ticks.changed() => {
                    if changed.is_err() {
                        info!("clock stopped, ending prayer session");
                        break;
                    }
                }
            }
        }
        if let Err(e) = self.scheduler.cancel_all() {
            warn!(error = %e, "failed to cancel reminders on shutdown");
        }
    }
}

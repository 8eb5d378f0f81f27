//! Periodic tick that keeps "now" fresh for derived queries.
//!
//! The clock holds no schedule data. Consumers read the latest [`Tick`] from a
//! watch channel and decide for themselves whether their schedule went stale.

use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::zone::DayZone;

pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub now: DateTime<Utc>,
    /// Calendar day containing `now` in the clock's zone.
    pub today: NaiveDate,
}

impl Tick {
    /// Whether a schedule loaded for `loaded_date` is no longer today's.
    pub fn rolled_over(&self, loaded_date: NaiveDate) -> bool {
        loaded_date != self.today
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduleClock {
    period: Duration,
    zone: DayZone,
}

impl ScheduleClock {
    pub fn new(zone: DayZone) -> Self {
        Self {
            period: DEFAULT_TICK,
            zone,
        }
    }

    /// Override the tick period. Zero is clamped to one millisecond.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(Duration::from_millis(1));
        self
    }

    pub fn tick_at(&self, now: DateTime<Utc>) -> Tick {
        Tick {
            now,
            today: self.zone.today(now),
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick_at(Utc::now())
    }

    /// A watch channel seeded with the current tick.
    pub fn channel(&self) -> (watch::Sender<Tick>, watch::Receiver<Tick>) {
        watch::channel(self.tick())
    }

    /// Publish a tick every period until cancelled or every receiver is gone.
    ///
    /// Missed ticks are skipped rather than delivered in a burst.
    pub async fn run(self, tx: watch::Sender<Tick>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs(), "schedule clock started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("schedule clock cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if tx.send(self.tick()).is_err() {
                        debug!("no tick receivers left, stopping clock");
                        break;
                    }
                }
            }
        }
    }
}

//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use nur_core::{
    CacheError, CalculationMethod, DayZone, Location, PrayerSchedule, ScheduleCache,
    TimingSource, TimingSourceError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// Five fixed wall-clock times on `date` in `zone`.
pub fn schedule_for(zone: DayZone, date: NaiveDate, location: &Location) -> PrayerSchedule {
    let at = |h, m| zone.at(date, NaiveTime::from_hms_opt(h, m, 0).unwrap()).unwrap();
    PrayerSchedule::new(
        date,
        [at(5, 0), at(12, 0), at(15, 30), at(18, 0), at(19, 30)],
        format!("{} Ramadan 1447", date.format("%d")),
        location.clone(),
    )
    .unwrap()
}

/// Timing source that counts calls and can be told to fail or stall.
pub struct FakeSource {
    zone: DayZone,
    calls: AtomicUsize,
    delay: Duration,
    failing: Mutex<HashSet<NaiveDate>>,
    cancel_on: Option<(NaiveDate, CancellationToken)>,
}

impl FakeSource {
    pub fn new(zone: DayZone) -> Self {
        Self {
            zone,
            calls: AtomicUsize::new(0),
            delay: Duration::zero(),
            failing: Mutex::new(HashSet::new()),
            cancel_on: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cancel `token` while fetching `date`.
    pub fn cancelling_on(mut self, date: NaiveDate, token: CancellationToken) -> Self {
        self.cancel_on = Some((date, token));
        self
    }

    pub fn fail_on(&self, date: NaiveDate) {
        self.failing.lock().unwrap().insert(date);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimingSource for FakeSource {
    async fn fetch(
        &self,
        date: NaiveDate,
        location: &Location,
        _method: CalculationMethod,
    ) -> Result<PrayerSchedule, TimingSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(delay) = self.delay.to_std() {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        if let Some((cancel_date, token)) = &self.cancel_on {
            if *cancel_date == date {
                token.cancel();
            }
        }
        if self.failing.lock().unwrap().contains(&date) {
            return Err(TimingSourceError::Unreachable("offline".into()));
        }
        Ok(schedule_for(self.zone, date, location))
    }
}

/// Cache whose every operation fails.
pub struct BrokenCache;

impl ScheduleCache for BrokenCache {
    fn get(
        &self,
        _date: NaiveDate,
        _location: Option<&Location>,
    ) -> Result<Option<PrayerSchedule>, CacheError> {
        Err(CacheError::Unavailable("database is locked".into()))
    }

    fn put(&self, _schedule: &PrayerSchedule) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("disk full".into()))
    }

    fn evict_older_than_at(&self, _max_age_days: u32, _today: NaiveDate) -> Result<usize, CacheError> {
        Err(CacheError::Unavailable("database is locked".into()))
    }

    fn clear(&self) -> Result<usize, CacheError> {
        Err(CacheError::Unavailable("database is locked".into()))
    }

    fn len(&self) -> Result<usize, CacheError> {
        Err(CacheError::Unavailable("database is locked".into()))
    }
}

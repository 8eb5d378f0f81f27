//! Cache-first schedule access.
//!
//! A lookup reads the cache and only on a miss asks the timing source, then
//! writes the result back. Concurrent lookups for the same day and place are
//! coalesced: the second waits for the first fetch and re-reads the cache.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::location::Location;
use crate::method::CalculationMethod;
use crate::prayer::PrayerSchedule;
use crate::storage::{ScheduleCache, DEFAULT_MAX_AGE_DAYS};
use crate::timing::TimingSource;
use crate::zone::DayZone;

/// Days covered by [`ScheduleProvider::get_week`], today included.
pub const WEEK_DAYS: i64 = 7;
/// Days covered by [`ScheduleProvider::get_month`], today included.
pub const MONTH_DAYS: i64 = 30;

/// Result of a range fetch that keeps going past failed days.
#[derive(Debug, Default)]
pub struct RangeReport {
    /// Successfully loaded days, ascending.
    pub schedules: Vec<PrayerSchedule>,
    /// Days that failed, ascending.
    pub failures: Vec<(NaiveDate, ProviderError)>,
}

impl RangeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Coordinates are compared bit-for-bit, same as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FetchKey {
    date: NaiveDate,
    latitude: u64,
    longitude: u64,
}

impl FetchKey {
    fn new(date: NaiveDate, location: &Location) -> Self {
        Self {
            date,
            latitude: location.latitude.to_bits(),
            longitude: location.longitude.to_bits(),
        }
    }
}

type Gate = Arc<tokio::sync::Mutex<()>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a coalescing gate; the map entry goes away with the last holder.
struct InFlight<'a> {
    gates: &'a Mutex<HashMap<FetchKey, Gate>>,
    key: FetchKey,
    gate: Gate,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut gates = lock(self.gates);
        // One reference in the map, one here.
        if Arc::strong_count(&self.gate) == 2 {
            gates.remove(&self.key);
        }
    }
}

pub struct ScheduleProvider {
    cache: Arc<dyn ScheduleCache>,
    source: Arc<dyn TimingSource>,
    zone: DayZone,
    max_age_days: u32,
    gates: Mutex<HashMap<FetchKey, Gate>>,
    last_eviction: Mutex<Option<NaiveDate>>,
}

impl ScheduleProvider {
    pub fn new(
        cache: Arc<dyn ScheduleCache>,
        source: Arc<dyn TimingSource>,
        zone: DayZone,
    ) -> Self {
        Self {
            cache,
            source,
            zone,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            gates: Mutex::new(HashMap::new()),
            last_eviction: Mutex::new(None),
        }
    }

    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub async fn get_today(
        &self,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, ProviderError> {
        self.get_today_at(Utc::now(), location, method).await
    }

    /// Schedule for the calendar day containing `now` in the provider's zone.
    pub async fn get_today_at(
        &self,
        now: DateTime<Utc>,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, ProviderError> {
        self.get_for_date(self.zone.today(now), location, method).await
    }

    /// Cache hit, or fetch-and-store on a miss.
    ///
    /// Cache hits are keyed by date and place only; `method` is used solely
    /// for a fetch. Timing source errors propagate unchanged.
    pub async fn get_for_date(
        &self,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, ProviderError> {
        if let Some(schedule) = self.cached(date, location) {
            return Ok(schedule);
        }

        let in_flight = self.enter(FetchKey::new(date, location));
        let _guard = in_flight.gate.lock().await;

        // Whoever held the gate before us may have filled the cache.
        if let Some(schedule) = self.cached(date, location) {
            return Ok(schedule);
        }
        self.fetch_and_store(date, location, method).await
    }

    /// Inclusive range, one schedule per day, ascending. The first failed
    /// day aborts the range with that day's error.
    pub async fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, ProviderError> {
        self.range_strict(start, end, location, method, None).await
    }

    /// Like [`get_range`](Self::get_range), checking `cancel` before each
    /// day. Days completed before cancellation stay cached.
    pub async fn get_range_cancellable(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: &Location,
        method: CalculationMethod,
        cancel: &CancellationToken,
    ) -> Result<Vec<PrayerSchedule>, ProviderError> {
        self.range_strict(start, end, location, method, Some(cancel))
            .await
    }

    /// Every day of the range is attempted; failures are reported per day.
    pub async fn get_range_lenient(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<RangeReport, ProviderError> {
        let mut report = RangeReport::default();
        for date in days(start, end)? {
            match self.get_for_date(date, location, method).await {
                Ok(schedule) => report.schedules.push(schedule),
                Err(e) => {
                    warn!(%date, error = %e, "range day failed");
                    report.failures.push((date, e));
                }
            }
        }
        Ok(report)
    }

    /// Today and the six days after it.
    pub async fn get_week(
        &self,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, ProviderError> {
        let (start, end) = self.span_from_today(WEEK_DAYS);
        self.get_range(start, end, location, method).await
    }

    /// Today and the twenty-nine days after it.
    pub async fn get_month(
        &self,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<Vec<PrayerSchedule>, ProviderError> {
        let (start, end) = self.span_from_today(MONTH_DAYS);
        self.get_range(start, end, location, method).await
    }

    /// `(today, today + days - 1)` in the provider's zone.
    pub fn span_from_today(&self, days: i64) -> (NaiveDate, NaiveDate) {
        let start = self.zone.today(Utc::now());
        (start, start + Duration::days(days.max(1) - 1))
    }

    async fn range_strict(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        location: &Location,
        method: CalculationMethod,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<PrayerSchedule>, ProviderError> {
        let mut schedules = Vec::new();
        for date in days(start, end)? {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(%date, loaded = schedules.len(), "range fetch cancelled");
                return Err(ProviderError::Cancelled);
            }
            schedules.push(self.get_for_date(date, location, method).await?);
        }
        Ok(schedules)
    }

    fn enter(&self, key: FetchKey) -> InFlight<'_> {
        let gate = Arc::clone(lock(&self.gates).entry(key).or_default());
        InFlight {
            gates: &self.gates,
            key,
            gate,
        }
    }

    /// A read failure counts as a miss.
    fn cached(&self, date: NaiveDate, location: &Location) -> Option<PrayerSchedule> {
        match self.cache.get(date, Some(location)) {
            Ok(Some(schedule)) => {
                debug!(%date, city = %location.city, "schedule cache hit");
                Some(schedule)
            }
            Ok(None) => {
                debug!(%date, city = %location.city, "schedule cache miss");
                None
            }
            Err(e) => {
                warn!(%date, error = %e, "schedule cache read failed, fetching instead");
                None
            }
        }
    }

    async fn fetch_and_store(
        &self,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, ProviderError> {
        info!(%date, city = %location.city, method = method.code(), "fetching prayer times");
        let schedule = self.source.fetch(date, location, method).await?;

        if let Err(e) = self.cache.put(&schedule) {
            warn!(%date, error = %e, "failed to cache fetched schedule");
        }
        self.evict_once_per_day();
        Ok(schedule)
    }

    fn evict_once_per_day(&self) {
        let today = self.zone.today(Utc::now());
        {
            let mut last = lock(&self.last_eviction);
            if *last == Some(today) {
                return;
            }
            *last = Some(today);
        }
        match self.cache.evict_older_than_at(self.max_age_days, today) {
            Ok(0) => {}
            Ok(removed) => info!(removed, max_age_days = self.max_age_days, "evicted old schedules"),
            Err(e) => warn!(error = %e, "schedule eviction failed"),
        }
    }
}

fn days(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<impl Iterator<Item = NaiveDate>, ProviderError> {
    if start > end {
        return Err(ProviderError::InvalidRange { start, end });
    }
    Ok(start.iter_days().take_while(move |d| *d <= end))
}

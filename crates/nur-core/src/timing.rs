//! Remote timing source: one day's five prayer times over HTTP.
//!
//! The source is the only component that crosses the process boundary. It
//! never retries and never falls back to stale data; that policy belongs to
//! the provider.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::TimingSourceError;
use crate::location::Location;
use crate::method::CalculationMethod;
use crate::prayer::{Prayer, PrayerSchedule};
use crate::storage::TimingSourceConfig;
use crate::zone::DayZone;

/// Anything that can produce a day's schedule for a place.
#[async_trait]
pub trait TimingSource: Send + Sync {
    async fn fetch(
        &self,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, TimingSourceError>;
}

#[derive(Debug, Deserialize)]
struct TimingsResponse {
    data: TimingsData,
}

#[derive(Debug, Deserialize)]
struct TimingsData {
    timings: RawTimings,
    date: RawDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTimings {
    fajr: String,
    dhuhr: String,
    asr: String,
    maghrib: String,
    isha: String,
}

impl RawTimings {
    fn get(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDate {
    hijri: RawHijri,
}

#[derive(Debug, Deserialize)]
struct RawHijri {
    day: String,
    month: RawHijriMonth,
    year: String,
}

#[derive(Debug, Deserialize)]
struct RawHijriMonth {
    en: String,
}

/// Client for the Aladhan `timings` endpoint.
pub struct AladhanClient {
    client: reqwest::Client,
    base_url: String,
    zone: DayZone,
}

impl AladhanClient {
    /// # Errors
    /// Returns `InvalidRequest` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        zone: DayZone,
    ) -> Result<Self, TimingSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nur/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TimingSourceError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            zone,
        })
    }

    pub fn from_config(config: &TimingSourceConfig, zone: DayZone) -> Result<Self, TimingSourceError> {
        Self::new(&config.base_url, config.timeout(), zone)
    }

    /// `{base}/{local noon unix ts}?latitude=..&longitude=..&method=..`
    fn request_url(
        &self,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<Url, TimingSourceError> {
        location
            .validate()
            .map_err(|e| TimingSourceError::InvalidRequest(e.to_string()))?;

        let noon = self.zone.noon(date).ok_or_else(|| {
            TimingSourceError::InvalidRequest(format!("no local noon on {date}"))
        })?;

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            TimingSourceError::InvalidRequest(format!("base URL '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TimingSourceError::InvalidRequest(format!(
                "base URL '{}' is not http(s)",
                self.base_url
            )));
        }
        url.path_segments_mut()
            .map_err(|()| {
                TimingSourceError::InvalidRequest(format!("base URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .push(&noon.timestamp().to_string());
        url.query_pairs_mut()
            .append_pair("latitude", &location.latitude.to_string())
            .append_pair("longitude", &location.longitude.to_string())
            .append_pair("method", &method.code().to_string());
        Ok(url)
    }

    fn build_schedule(
        &self,
        date: NaiveDate,
        location: &Location,
        data: TimingsData,
    ) -> Result<PrayerSchedule, TimingSourceError> {
        let mut times = Vec::with_capacity(Prayer::ALL.len());
        for prayer in Prayer::ALL {
            let raw = data.timings.get(prayer);
            let time = parse_wall_time(raw).ok_or_else(|| {
                TimingSourceError::BadResponse(format!("{prayer}: unparseable time '{raw}'"))
            })?;
            let instant = self.zone.at(date, time).ok_or_else(|| {
                TimingSourceError::BadResponse(format!("{prayer}: {raw} does not exist on {date}"))
            })?;
            times.push(instant);
        }
        let times: [_; 5] = times
            .try_into()
            .map_err(|_| TimingSourceError::BadResponse("expected five prayer times".into()))?;

        let hijri = &data.date.hijri;
        let hijri_date = format!("{} {} {}", hijri.day, hijri.month.en, hijri.year);

        PrayerSchedule::new(date, times, hijri_date, location.clone())
            .map_err(|e| TimingSourceError::BadResponse(e.to_string()))
    }
}

/// "HH:MM" with an optional " (TZ)" annotation after the first space.
fn parse_wall_time(raw: &str) -> Option<NaiveTime> {
    let hhmm = raw.trim().split(' ').next()?;
    NaiveTime::parse_from_str(hhmm, "%H:%M").ok()
}

#[async_trait]
impl TimingSource for AladhanClient {
    async fn fetch(
        &self,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<PrayerSchedule, TimingSourceError> {
        let url = self.request_url(date, location, method)?;
        debug!(%url, "requesting prayer timings");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TimingSourceError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TimingSourceError::Unreachable(format!("HTTP {status}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TimingSourceError::Unreachable(e.to_string()))?;
        let parsed: TimingsResponse = serde_json::from_slice(&body)
            .map_err(|e| TimingSourceError::BadResponse(e.to_string()))?;

        self.build_schedule(date, location, parsed.data)
    }
}

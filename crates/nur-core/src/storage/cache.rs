//! SQLite-backed cache of one prayer schedule per (day, place).
//!
//! Provides:
//! - Lookup by calendar day, disambiguated by coordinates
//! - Upsert keyed by (day, latitude, longitude)
//! - Date-based eviction

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::data_dir;
use crate::error::CacheError;
use crate::location::Location;
use crate::prayer::PrayerSchedule;

/// Schedules dated further back than this many days are evicted.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Durable store of prayer schedules.
pub trait ScheduleCache: Send + Sync {
    /// The schedule cached for `date`.
    ///
    /// With a location, only an entry at the same coordinates matches.
    /// Without one, the most recently stored entry for the day is returned.
    fn get(
        &self,
        date: NaiveDate,
        location: Option<&Location>,
    ) -> Result<Option<PrayerSchedule>, CacheError>;

    /// Insert or replace the entry for the schedule's day and coordinates.
    fn put(&self, schedule: &PrayerSchedule) -> Result<(), CacheError>;

    /// Remove entries dated more than `max_age_days` before `today`.
    /// Returns the number of entries removed.
    fn evict_older_than_at(&self, max_age_days: u32, today: NaiveDate)
        -> Result<usize, CacheError>;

    /// [`evict_older_than_at`](Self::evict_older_than_at) with today taken
    /// from the system local zone. Callers that reckon days in a configured
    /// [`DayZone`](crate::DayZone) pass their own today instead.
    fn evict_older_than(&self, max_age_days: u32) -> Result<usize, CacheError> {
        self.evict_older_than_at(max_age_days, Local::now().date_naive())
    }

    /// Remove every entry.
    fn clear(&self) -> Result<usize, CacheError>;

    fn len(&self) -> Result<usize, CacheError>;

    fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

/// SQLite schedule cache.
///
/// The connection sits behind a mutex so one cache can be shared across
/// tasks; every statement is short and never held across an await.
pub struct SqliteScheduleCache {
    conn: Mutex<Connection>,
}

/// Columns as stored, before validation.
struct StoredRow {
    day: String,
    latitude: f64,
    longitude: f64,
    city: String,
    country: String,
    is_manual: bool,
    times: [String; 5],
    hijri_date: String,
}

impl SqliteScheduleCache {
    /// Open the cache at `~/.config/nur/nur.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CacheError> {
        let dir = data_dir().map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("nur.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory cache.
    pub fn open_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.migrate()?;
        Ok(cache)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<(), CacheError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS prayer_schedules (
                day         TEXT NOT NULL,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                city        TEXT NOT NULL DEFAULT '',
                country     TEXT NOT NULL DEFAULT '',
                is_manual   INTEGER NOT NULL DEFAULT 0,
                fajr        TEXT NOT NULL,
                dhuhr       TEXT NOT NULL,
                asr         TEXT NOT NULL,
                maghrib     TEXT NOT NULL,
                isha        TEXT NOT NULL,
                hijri_date  TEXT NOT NULL DEFAULT '',
                revision    INTEGER NOT NULL,
                PRIMARY KEY (day, latitude, longitude)
            );

            CREATE INDEX IF NOT EXISTS idx_prayer_schedules_day_revision
                ON prayer_schedules(day, revision);",
        )?;
        Ok(())
    }

    fn read_row(row: &rusqlite::Row) -> Result<StoredRow, rusqlite::Error> {
        Ok(StoredRow {
            day: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            city: row.get(3)?,
            country: row.get(4)?,
            is_manual: row.get(5)?,
            times: [row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?],
            hijri_date: row.get(11)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT day, latitude, longitude, city, country, is_manual,
        fajr, dhuhr, asr, maghrib, isha, hijri_date
     FROM prayer_schedules";

impl StoredRow {
    fn into_schedule(self) -> Result<PrayerSchedule, CacheError> {
        let date = NaiveDate::parse_from_str(&self.day, DAY_FORMAT)
            .map_err(|e| CacheError::Corrupt(format!("day '{}': {e}", self.day)))?;

        let mut times = [DateTime::<Utc>::MIN_UTC; 5];
        for (slot, raw) in times.iter_mut().zip(&self.times) {
            *slot = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| CacheError::Corrupt(format!("timestamp '{raw}': {e}")))?
                .with_timezone(&Utc);
        }

        let location = Location {
            latitude: self.latitude,
            longitude: self.longitude,
            city: self.city,
            country: self.country,
            is_manual: self.is_manual,
        };
        PrayerSchedule::new(date, times, self.hijri_date, location)
            .map_err(|e| CacheError::Corrupt(e.to_string()))
    }
}

impl ScheduleCache for SqliteScheduleCache {
    fn get(
        &self,
        date: NaiveDate,
        location: Option<&Location>,
    ) -> Result<Option<PrayerSchedule>, CacheError> {
        let day = date.format(DAY_FORMAT).to_string();
        let conn = self.conn();
        let row = match location {
            Some(loc) => conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE day = ?1 AND latitude = ?2 AND longitude = ?3"),
                    params![day, loc.latitude, loc.longitude],
                    Self::read_row,
                )
                .optional()?,
            None => conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE day = ?1 ORDER BY revision DESC LIMIT 1"),
                    params![day],
                    Self::read_row,
                )
                .optional()?,
        };
        drop(conn);
        row.map(StoredRow::into_schedule).transpose()
    }

    fn put(&self, schedule: &PrayerSchedule) -> Result<(), CacheError> {
        let loc = schedule.location();
        let times: Vec<String> = schedule.times().iter().map(|t| t.to_rfc3339()).collect();
        self.conn().execute(
            "INSERT INTO prayer_schedules
                (day, latitude, longitude, city, country, is_manual,
                 fajr, dhuhr, asr, maghrib, isha, hijri_date, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                 (SELECT COALESCE(MAX(revision), 0) + 1 FROM prayer_schedules))
             ON CONFLICT(day, latitude, longitude) DO UPDATE SET
                city = excluded.city,
                country = excluded.country,
                is_manual = excluded.is_manual,
                fajr = excluded.fajr,
                dhuhr = excluded.dhuhr,
                asr = excluded.asr,
                maghrib = excluded.maghrib,
                isha = excluded.isha,
                hijri_date = excluded.hijri_date,
                revision = excluded.revision",
            params![
                schedule.date().format(DAY_FORMAT).to_string(),
                loc.latitude,
                loc.longitude,
                loc.city,
                loc.country,
                loc.is_manual,
                times[0],
                times[1],
                times[2],
                times[3],
                times[4],
                schedule.hijri_date(),
            ],
        )?;
        Ok(())
    }

    fn evict_older_than_at(
        &self,
        max_age_days: u32,
        today: NaiveDate,
    ) -> Result<usize, CacheError> {
        let cutoff = today - Duration::days(i64::from(max_age_days));
        let removed = self.conn().execute(
            "DELETE FROM prayer_schedules WHERE day < ?1",
            params![cutoff.format(DAY_FORMAT).to_string()],
        )?;
        Ok(removed)
    }

    fn clear(&self) -> Result<usize, CacheError> {
        Ok(self.conn().execute("DELETE FROM prayer_schedules", [])?)
    }

    fn len(&self) -> Result<usize, CacheError> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM prayer_schedules", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

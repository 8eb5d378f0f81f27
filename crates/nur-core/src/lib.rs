//! # Nur Core Library
//!
//! This library provides the core logic for Nur, a prayer schedule and
//! reminder engine. Everything the `nur` CLI does is available here, so any
//! other front end can be a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Timing source**: fetches one day's five prayer times from a remote
//!   service (Aladhan by default)
//! - **Storage**: SQLite schedule cache and TOML configuration
//! - **Provider**: cache-first schedule lookup with per-day fetch coalescing
//! - **Reminders**: turns a schedule plus preferences into timed alerts
//! - **Clock / Session**: a periodic tick that keeps "now" fresh and reloads
//!   the schedule when the calendar day rolls over
//!
//! ## Key Components
//!
//! - [`PrayerSchedule`]: one day's immutable schedule and derived queries
//! - [`ScheduleProvider`]: cache-then-fetch access to schedules
//! - [`ReminderScheduler`]: full-replace reminder materialization
//! - [`PrayerSession`]: single logical owner of the active schedule
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod location;
pub mod method;
pub mod prayer;
pub mod preferences;
pub mod provider;
pub mod reminder;
pub mod session;
pub mod storage;
pub mod timing;
pub mod zone;

pub use clock::{ScheduleClock, Tick};
pub use error::{
    CacheError, ConfigError, CoreError, ProviderError, SchedulingError, TimingSourceError,
    TimingSourceErrorKind, ValidationError,
};
pub use location::Location;
pub use method::CalculationMethod;
pub use prayer::{format_countdown, Prayer, PrayerSchedule};
pub use preferences::ReminderPreferences;
pub use provider::{RangeReport, ScheduleProvider};
pub use reminder::{
    MaterializeReport, MemoryDelivery, ReminderDelivery, ReminderScheduler, ScheduledReminder,
    TaskDelivery,
};
pub use session::{PrayerSession, SessionSettings};
pub use storage::{Config, ScheduleCache, SqliteScheduleCache};
pub use timing::{AladhanClient, TimingSource};
pub use zone::DayZone;

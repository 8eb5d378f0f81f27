pub mod cache;
pub mod config;
pub mod location;
pub mod methods;
pub mod range;
pub mod reminders;
pub mod today;
pub mod watch;

use nur_core::{AladhanClient, Config, ScheduleProvider, SqliteScheduleCache};
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Provider over the on-disk cache and the configured timing source.
pub fn open_provider(config: &Config) -> Result<ScheduleProvider, Box<dyn std::error::Error>> {
    let zone = config.day_zone()?;
    let cache = Arc::new(SqliteScheduleCache::open()?);
    let source = Arc::new(AladhanClient::from_config(&config.timing_source, zone)?);
    Ok(ScheduleProvider::new(cache, source, zone).with_max_age_days(config.cache.max_age_days))
}

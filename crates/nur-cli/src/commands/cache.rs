use chrono::Utc;
use clap::Subcommand;
use nur_core::{Config, ScheduleCache, SqliteScheduleCache};

use super::CliResult;

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove schedules older than the configured (or given) age
    Evict {
        /// Maximum age in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Remove every cached schedule
    Clear,
    /// Number of cached schedules
    Stats,
}

pub fn run(action: CacheAction) -> CliResult {
    let cache = SqliteScheduleCache::open()?;
    match action {
        CacheAction::Evict { days } => {
            let config = Config::load()?;
            let max_age = days.unwrap_or(config.cache.max_age_days);
            let today = config.day_zone()?.today(Utc::now());
            let removed = cache.evict_older_than_at(max_age, today)?;
            println!("removed {removed} schedules older than {max_age} days");
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("removed {removed} schedules");
        }
        CacheAction::Stats => {
            println!("{} cached schedules", cache.len()?);
        }
    }
    Ok(())
}

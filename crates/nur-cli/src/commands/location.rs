use clap::Subcommand;
use nur_core::{Config, Location, ScheduleCache, SqliteScheduleCache};

use super::CliResult;

#[derive(Subcommand)]
pub enum LocationAction {
    /// Show the configured location
    Show,
    /// Set the location manually
    Set {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        city: String,
        /// Country name
        #[arg(long)]
        country: Option<String>,
    },
}

pub fn run(action: LocationAction) -> CliResult {
    match action {
        LocationAction::Show => {
            let config = Config::load()?;
            println!("{}", config.location.display_name());
            println!("{}", config.location.coordinate_string());
        }
        LocationAction::Set {
            lat,
            lon,
            city,
            country,
        } => {
            let mut location = Location::new(lat, lon, city).manual();
            if let Some(country) = country {
                location = location.with_country(country);
            }
            location.validate()?;

            let mut config = Config::load()?;
            let distance = config.location.distance_km(&location);
            if config.location.has_significant_change(&location) {
                // Cached schedules for the old place are useless now.
                let removed = SqliteScheduleCache::open()?.clear()?;
                println!("moved {distance:.0} km, cleared {removed} cached schedules");
            }
            config.location = location;
            config.save()?;
            println!("location set to {}", config.location.display_name());
        }
    }
    Ok(())
}

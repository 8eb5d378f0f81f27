use chrono::Utc;
use clap::Args;
use nur_core::{format_countdown, Config, Prayer};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{open_provider, CliResult};

#[derive(Args)]
pub struct TodayArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TodayOutput {
    date: String,
    hijri_date: String,
    location: String,
    times: BTreeMap<String, String>,
    current: Option<String>,
    next: Option<String>,
    next_in_seconds: Option<i64>,
    remaining: usize,
}

pub async fn run(args: TodayArgs) -> CliResult {
    let config = Config::load()?;
    let zone = config.day_zone()?;
    let provider = open_provider(&config)?;

    let now = Utc::now();
    let schedule = provider
        .get_today_at(now, &config.location, config.calculation_method)
        .await?;
    let current = schedule.current_prayer(now).map(|(p, _)| p);
    let next = schedule.next_prayer(now);

    if args.json {
        let output = TodayOutput {
            date: schedule.date().to_string(),
            hijri_date: schedule.hijri_date().to_string(),
            location: schedule.location().display_name(),
            times: schedule
                .entries()
                .map(|(p, t)| (p.name().to_string(), t.to_rfc3339()))
                .collect(),
            current: current.map(|p| p.name().to_string()),
            next: next.map(|(p, _)| p.name().to_string()),
            next_in_seconds: next.map(|(_, t)| (t - now).num_seconds()),
            remaining: schedule.remaining_count(now),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{}  {}  ({})",
        schedule.location().display_name(),
        schedule.date(),
        schedule.hijri_date()
    );
    println!("Method: {}", config.calculation_method.display_name());
    println!();
    for (prayer, time) in schedule.entries() {
        let marker = if Some(prayer) == current { "  <- now" } else { "" };
        println!("  {:<8} {}{marker}", prayer.name(), zone.format(time, "%H:%M"));
    }
    println!();
    match next {
        Some((prayer, time)) => println!(
            "Next: {} {} ({} remaining today)",
            prayer.name(),
            format_countdown(time - now),
            schedule.remaining_count(now)
        ),
        None => println!("All prayers for today have passed. {} is next tomorrow.", Prayer::Fajr),
    }
    Ok(())
}

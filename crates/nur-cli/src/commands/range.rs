use clap::Args;
use nur_core::provider::{MONTH_DAYS, WEEK_DAYS};
use nur_core::{Config, DayZone, PrayerSchedule};

use super::{open_provider, CliResult};

#[derive(Args)]
pub struct RangeArgs {
    /// Show the days that loaded and list failed days instead of aborting
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Span {
    Week,
    Month,
}

impl Span {
    fn days(self) -> i64 {
        match self {
            Span::Week => WEEK_DAYS,
            Span::Month => MONTH_DAYS,
        }
    }
}

pub async fn run(span: Span, args: RangeArgs) -> CliResult {
    let config = Config::load()?;
    let zone = config.day_zone()?;
    let provider = open_provider(&config)?;

    println!("{}", config.location.display_name());
    println!(
        "{:<10}  {:<5}  {:<5}  {:<5}  {:<7}  {:<5}  Hijri",
        "Date", "Fajr", "Dhuhr", "Asr", "Maghrib", "Isha"
    );

    if args.lenient {
        let (start, end) = provider.span_from_today(span.days());
        let report = provider
            .get_range_lenient(start, end, &config.location, config.calculation_method)
            .await?;
        for schedule in &report.schedules {
            print_row(zone, schedule);
        }
        for (date, err) in &report.failures {
            eprintln!("{date}: {err}");
        }
        if !report.is_complete() {
            eprintln!("{} of {} days failed", report.failures.len(), span.days());
        }
    } else {
        let (location, method) = (&config.location, config.calculation_method);
        let schedules = match span {
            Span::Week => provider.get_week(location, method).await?,
            Span::Month => provider.get_month(location, method).await?,
        };
        for schedule in &schedules {
            print_row(zone, schedule);
        }
    }
    Ok(())
}

fn print_row(zone: DayZone, schedule: &PrayerSchedule) {
    let t: Vec<String> = schedule
        .times()
        .iter()
        .map(|time| zone.format(*time, "%H:%M"))
        .collect();
    println!(
        "{}  {:<5}  {:<5}  {:<5}  {:<7}  {:<5}  {}",
        schedule.date(),
        t[0],
        t[1],
        t[2],
        t[3],
        t[4],
        schedule.hijri_date()
    );
}

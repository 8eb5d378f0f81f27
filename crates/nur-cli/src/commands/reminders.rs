use chrono::Utc;
use clap::Args;
use nur_core::preferences::lead_time_label;
use nur_core::{Config, MemoryDelivery, ReminderScheduler};
use std::sync::Arc;

use super::{open_provider, CliResult};

#[derive(Args)]
pub struct RemindersArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

/// Materialize today's reminders into memory and list them. Nothing fires.
pub async fn run(args: RemindersArgs) -> CliResult {
    let config = Config::load()?;
    let zone = config.day_zone()?;
    let provider = open_provider(&config)?;

    let now = Utc::now();
    let schedule = provider
        .get_today_at(now, &config.location, config.calculation_method)
        .await?;

    let delivery = Arc::new(MemoryDelivery::new());
    let mut scheduler = ReminderScheduler::new(delivery.clone());
    let report = scheduler.materialize_at(&schedule, &config.reminders, &config.user_name, now)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&delivery.pending())?);
        return Ok(());
    }

    if report.scheduled.is_empty() {
        println!("No reminders left for {}.", schedule.date());
    }
    for reminder in delivery.pending() {
        println!(
            "{}  {:<14} {}  ({})",
            zone.format(reminder.fire_at, "%H:%M"),
            reminder.title,
            reminder.body,
            lead_time_label(reminder.lead_minutes)
        );
    }
    if !report.skipped_past_due.is_empty() {
        let names: Vec<_> = report.skipped_past_due.iter().map(|p| p.name()).collect();
        println!("Already passed: {}", names.join(", "));
    }
    for (prayer, err) in &report.failures {
        eprintln!("{prayer}: {err}");
    }
    Ok(())
}

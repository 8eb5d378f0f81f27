use nur_core::{
    Config, PrayerSession, ReminderScheduler, ScheduleClock, SessionSettings, TaskDelivery,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{open_provider, CliResult};

/// Run the clock and session until Ctrl-C, printing reminders as they fire.
pub async fn run() -> CliResult {
    let config = Config::load()?;
    let zone = config.day_zone()?;
    let provider = Arc::new(open_provider(&config)?);

    let (delivery, mut fired) = TaskDelivery::new();
    let scheduler = ReminderScheduler::new(Arc::new(delivery));
    let mut session = PrayerSession::new(provider, scheduler, SessionSettings::from_config(&config));

    let clock = ScheduleClock::new(zone).with_period(config.clock.tick_interval());
    let (tick_tx, tick_rx) = clock.channel();
    let cancel = CancellationToken::new();

    let clock_task = tokio::spawn(clock.run(tick_tx, cancel.child_token()));
    let session_cancel = cancel.child_token();
    let session_task = tokio::spawn(async move {
        session.run(tick_rx, session_cancel).await;
    });

    println!(
        "Watching prayer times for {}. Press Ctrl-C to stop.",
        config.location.display_name()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            reminder = fired.recv() => match reminder {
                Some(reminder) => println!(
                    "[{}] {}: {}",
                    zone.format(reminder.fire_at, "%H:%M"),
                    reminder.title,
                    reminder.body
                ),
                None => break,
            },
        }
    }

    cancel.cancel();
    let _ = tokio::join!(clock_task, session_task);
    Ok(())
}

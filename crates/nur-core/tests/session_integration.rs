//! Integration tests for the session: day rollover and rescheduling.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{day, FakeSource};
use nur_core::{
    CalculationMethod, DayZone, Location, MemoryDelivery, Prayer, PrayerSession,
    ReminderPreferences, ReminderScheduler, ScheduleClock, ScheduleProvider, SessionSettings,
    SqliteScheduleCache,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn settings() -> SessionSettings {
    SessionSettings {
        location: Location::mecca(),
        method: CalculationMethod::UmmAlQura,
        preferences: ReminderPreferences::default(),
        user_name: "Ayub".into(),
    }
}

struct Harness {
    session: PrayerSession,
    source: Arc<FakeSource>,
    delivery: Arc<MemoryDelivery>,
    clock: ScheduleClock,
}

fn harness() -> Harness {
    let zone = DayZone::utc();
    let cache = Arc::new(SqliteScheduleCache::open_memory().unwrap());
    let source = Arc::new(FakeSource::new(zone));
    let provider = Arc::new(ScheduleProvider::new(cache, source.clone(), zone));
    let delivery = Arc::new(MemoryDelivery::new());
    let scheduler = ReminderScheduler::new(delivery.clone());
    Harness {
        session: PrayerSession::new(provider, scheduler, settings()),
        source,
        delivery,
        clock: ScheduleClock::new(zone),
    }
}

#[tokio::test]
async fn test_first_tick_loads_schedule_and_reminders() {
    let mut h = harness();
    assert!(h.session.next_prayer(at(1, 4, 0)).is_none());
    assert_eq!(h.session.remaining_count(at(1, 4, 0)), 0);

    let report = h
        .session
        .on_tick(&h.clock.tick_at(at(1, 4, 0)))
        .await
        .unwrap()
        .expect("first tick refreshes");

    assert_eq!(report.scheduled.len(), 5);
    assert_eq!(h.delivery.pending().len(), 5);
    assert_eq!(h.delivery.pending()[0].body, "Ayub, Fajr prayer now");
    assert_eq!(h.session.current_prayer(at(1, 4, 0)), None);
    assert_eq!(h.session.next_prayer(at(1, 4, 0)), Some((Prayer::Fajr, at(1, 5, 0))));
    assert_eq!(h.session.remaining_count(at(1, 13, 0)), 3);
    assert_eq!(h.session.hijri_date(), Some("01 Ramadan 1447"));
}

#[tokio::test]
async fn test_same_day_ticks_do_not_refetch() {
    let mut h = harness();
    h.session.on_tick(&h.clock.tick_at(at(1, 4, 0))).await.unwrap();

    for hour in [6, 12, 23] {
        let outcome = h.session.on_tick(&h.clock.tick_at(at(1, hour, 0))).await.unwrap();
        assert!(outcome.is_none());
    }
    assert_eq!(h.source.calls(), 1);
    assert_eq!(
        h.session.current_prayer(at(1, 16, 0)),
        Some((Prayer::Asr, at(1, 15, 30)))
    );
}

#[tokio::test]
async fn test_rollover_replaces_schedule_and_reminders() {
    let mut h = harness();
    h.session.on_tick(&h.clock.tick_at(at(1, 4, 0))).await.unwrap();

    let report = h
        .session
        .on_tick(&h.clock.tick_at(at(2, 0, 1)))
        .await
        .unwrap()
        .expect("new day refreshes");

    assert_eq!(h.session.schedule().unwrap().date(), day(2));
    assert_eq!(h.source.calls(), 2);
    assert_eq!(report.scheduled.len(), 5);
    let pending = h.delivery.pending();
    assert_eq!(pending.len(), 5);
    assert!(pending.iter().all(|r| r.date == day(2)));
}

#[tokio::test]
async fn test_failed_refresh_is_retried_on_next_tick() {
    let mut h = harness();
    h.source.fail_on(day(1));

    assert!(h.session.on_tick(&h.clock.tick_at(at(1, 4, 0))).await.is_err());
    assert!(h.session.schedule().is_none());

    h.source.recover();
    let outcome = h.session.on_tick(&h.clock.tick_at(at(1, 4, 1))).await.unwrap();
    assert!(outcome.is_some());
    assert_eq!(h.session.schedule().unwrap().date(), day(1));
}

#[tokio::test]
async fn test_settings_change_reschedules() {
    let mut h = harness();
    h.session.on_tick(&h.clock.tick_at(at(1, 4, 0))).await.unwrap();

    let mut changed = settings();
    changed.preferences.set_enabled(Prayer::Fajr, false);
    changed.preferences.set_enabled(Prayer::Isha, false);
    changed.preferences.set_lead_minutes(Prayer::Maghrib, 15);
    changed.location = Location::new_york();

    let report = h
        .session
        .update_settings(changed, at(1, 4, 0))
        .await
        .unwrap();

    assert_eq!(report.scheduled.len(), 3);
    assert_eq!(h.source.calls(), 2);
    assert_eq!(h.session.schedule().unwrap().location(), &Location::new_york());
    let bodies: Vec<_> = h.delivery.pending().into_iter().map(|r| r.body).collect();
    assert!(bodies.contains(&"Ayub, Maghrib prayer in 15 minutes".to_string()));
    assert!(!bodies.iter().any(|b| b.contains("Fajr")));
}

#[tokio::test]
async fn test_failed_settings_change_withdraws_old_reminders() {
    let mut h = harness();
    h.session.on_tick(&h.clock.tick_at(at(1, 4, 0))).await.unwrap();
    assert_eq!(h.delivery.pending().len(), 5);

    h.source.fail_on(day(1));
    let mut changed = settings();
    changed.location = Location::new_york();
    for prayer in Prayer::ALL {
        changed.preferences.set_enabled(prayer, false);
    }

    let err = h.session.update_settings(changed, at(1, 4, 0)).await;
    assert!(err.is_err());
    assert!(h.session.schedule().is_none());
    assert!(h.delivery.pending().is_empty());
    assert!(h.session.scheduler().registered().is_empty());
}

#[tokio::test]
async fn test_run_follows_clock_until_it_stops() {
    let mut h = harness();
    let (tx, rx) = tokio::sync::watch::channel(h.clock.tick_at(at(1, 4, 0)));

    let delivery = h.delivery.clone();
    let clock = h.clock;
    let task = tokio::spawn(async move {
        h.session.run(rx, CancellationToken::new()).await;
        h
    });

    tx.send(clock.tick_at(at(2, 4, 0))).unwrap();
    drop(tx);

    let h = task.await.unwrap();
    assert_eq!(h.session.schedule().unwrap().date(), day(2));
    // Reminders are withdrawn when the session ends.
    assert!(delivery.pending().is_empty());
}

//! Integration tests for cache-first schedule access.

mod common;

use chrono::{Duration, Utc};
use common::{day, schedule_for, BrokenCache, FakeSource};
use nur_core::{
    CalculationMethod, DayZone, Location, ProviderError, ScheduleCache, ScheduleProvider,
    SqliteScheduleCache, TimingSourceError,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn setup(source: FakeSource) -> (ScheduleProvider, Arc<SqliteScheduleCache>, Arc<FakeSource>) {
    let cache = Arc::new(SqliteScheduleCache::open_memory().unwrap());
    let source = Arc::new(source);
    let provider = ScheduleProvider::new(cache.clone(), source.clone(), DayZone::utc());
    (provider, cache, source)
}

#[tokio::test]
async fn test_range_is_ascending_and_fetches_each_day_once() {
    let (provider, cache, source) = setup(FakeSource::new(DayZone::utc()));
    let mecca = Location::mecca();

    let week = provider
        .get_range(day(1), day(3), &mecca, CalculationMethod::UmmAlQura)
        .await
        .unwrap();

    let dates: Vec<_> = week.iter().map(|s| s.date()).collect();
    assert_eq!(dates, vec![day(1), day(2), day(3)]);
    assert_eq!(source.calls(), 3);
    assert_eq!(cache.len().unwrap(), 3);

    // Second pass is served from the cache.
    let again = provider
        .get_range(day(1), day(3), &mecca, CalculationMethod::UmmAlQura)
        .await
        .unwrap();
    assert_eq!(again, week);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let (provider, cache, source) = setup(FakeSource::new(DayZone::utc()));
    let stored = schedule_for(DayZone::utc(), day(5), &Location::mecca());
    cache.put(&stored).unwrap();

    let got = provider
        .get_for_date(day(5), &Location::mecca(), CalculationMethod::default())
        .await
        .unwrap();
    assert_eq!(got, stored);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_hits_are_keyed_by_date_and_place_only() {
    let (provider, _cache, source) = setup(FakeSource::new(DayZone::utc()));

    provider
        .get_for_date(day(5), &Location::mecca(), CalculationMethod::MuslimWorldLeague)
        .await
        .unwrap();
    // A different method does not miss.
    provider
        .get_for_date(day(5), &Location::mecca(), CalculationMethod::Egyptian)
        .await
        .unwrap();
    assert_eq!(source.calls(), 1);

    // A different place does.
    provider
        .get_for_date(day(5), &Location::new_york(), CalculationMethod::Egyptian)
        .await
        .unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_timing_error_propagates_and_caches_nothing() {
    let (provider, cache, source) = setup(FakeSource::new(DayZone::utc()));
    source.fail_on(day(9));

    let err = provider
        .get_for_date(day(9), &Location::mecca(), CalculationMethod::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProviderError::TimingSource(TimingSourceError::Unreachable("offline".into()))
    );
    assert!(cache.is_empty().unwrap());
}

#[tokio::test]
async fn test_strict_range_aborts_but_lenient_range_reports() {
    let (provider, _cache, source) = setup(FakeSource::new(DayZone::utc()));
    source.fail_on(day(11));
    let mecca = Location::mecca();

    let err = provider
        .get_range(day(10), day(12), &mecca, CalculationMethod::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::TimingSource(_)));
    // Day 12 was never attempted.
    assert_eq!(source.calls(), 2);

    let report = provider
        .get_range_lenient(day(10), day(12), &mecca, CalculationMethod::default())
        .await
        .unwrap();
    let loaded: Vec<_> = report.schedules.iter().map(|s| s.date()).collect();
    assert_eq!(loaded, vec![day(10), day(12)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, day(11));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_reversed_range_is_rejected() {
    let (provider, _cache, source) = setup(FakeSource::new(DayZone::utc()));
    let err = provider
        .get_range(day(3), day(1), &Location::mecca(), CalculationMethod::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProviderError::InvalidRange {
            start: day(3),
            end: day(1)
        }
    );
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_broken_cache_degrades_to_fetching() {
    let source = Arc::new(FakeSource::new(DayZone::utc()));
    let provider = ScheduleProvider::new(Arc::new(BrokenCache), source.clone(), DayZone::utc());

    for _ in 0..2 {
        let schedule = provider
            .get_for_date(day(7), &Location::mecca(), CalculationMethod::default())
            .await
            .unwrap();
        assert_eq!(schedule.date(), day(7));
    }
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_fetch() {
    let (provider, _cache, source) =
        setup(FakeSource::new(DayZone::utc()).with_delay(Duration::seconds(5)));
    let mecca = Location::mecca();

    let (a, b) = tokio::join!(
        provider.get_for_date(day(20), &mecca, CalculationMethod::default()),
        provider.get_for_date(day(20), &mecca, CalculationMethod::default()),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_for_different_days_do_not_wait_on_each_other() {
    let (provider, _cache, source) =
        setup(FakeSource::new(DayZone::utc()).with_delay(Duration::seconds(5)));
    let mecca = Location::mecca();

    let start = tokio::time::Instant::now();
    let (a, b) = tokio::join!(
        provider.get_for_date(day(20), &mecca, CalculationMethod::default()),
        provider.get_for_date(day(21), &mecca, CalculationMethod::default()),
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(source.calls(), 2);
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn test_cancelled_range_keeps_completed_days_cached() {
    let cancel = CancellationToken::new();
    let (provider, cache, source) =
        setup(FakeSource::new(DayZone::utc()).cancelling_on(day(2), cancel.clone()));

    let err = provider
        .get_range_cancellable(
            day(1),
            day(5),
            &Location::mecca(),
            CalculationMethod::default(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::Cancelled);
    assert_eq!(source.calls(), 2);
    assert!(cache.get(day(1), None).unwrap().is_some());
    assert!(cache.get(day(2), None).unwrap().is_some());
    assert!(cache.get(day(3), None).unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_evicts_stale_schedules() {
    let (provider, cache, _source) = setup(FakeSource::new(DayZone::utc()));
    let today = Utc::now().date_naive();
    let stale = today - Duration::days(40);
    cache
        .put(&schedule_for(DayZone::utc(), stale, &Location::mecca()))
        .unwrap();

    provider
        .get_for_date(today, &Location::mecca(), CalculationMethod::default())
        .await
        .unwrap();

    assert!(cache.get(stale, None).unwrap().is_none());
    assert!(cache.get(today, None).unwrap().is_some());
}

#[tokio::test]
async fn test_week_and_month_spans_start_today() {
    let (provider, _cache, _source) = setup(FakeSource::new(DayZone::utc()));
    let today = Utc::now().date_naive();

    let week = provider
        .get_week(&Location::mecca(), CalculationMethod::default())
        .await
        .unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date(), today);
    assert_eq!(week[6].date(), today + Duration::days(6));

    let (start, end) = provider.span_from_today(30);
    assert_eq!(start, today);
    assert_eq!(end, today + Duration::days(29));
}

//! Integration tests for the countdown and stock engines over SQLite.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use offerkit_core::storage::keys;
use offerkit_core::{
    admin, CountdownEngine, FixedJitter, KvBackend, ManualClock, SqliteBackend, StockConfig,
    StockEngine, Store,
};

#[test]
fn test_two_day_session_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offerkit.db");
    let start = Utc.with_ymd_and_hms(2024, 10, 5, 8, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let window = Duration::hours(48);
    let cfg = StockConfig::new(20, 6, 17).unwrap();

    {
        let store = Store::new(SqliteBackend::open(&path).unwrap());
        let countdown = CountdownEngine::with_clock(store.clone(), Arc::new(clock.clone()));
        let stock = StockEngine::with_parts(
            store,
            Arc::new(clock.clone()),
            Arc::new(FixedJitter(0.0)),
        );
        assert_eq!(countdown.read(window).hours, 48);
        assert_eq!(stock.read(&cfg), 20);

        // Visitor comes back an hour later: 60 / 17 = 3 decrements.
        clock.advance(Duration::hours(1));
        assert_eq!(countdown.read(window).hours, 47);
        assert_eq!(stock.read(&cfg), 17);
    }

    // New process, same file, two days later.
    clock.advance(Duration::hours(48));
    let store = Store::new(SqliteBackend::open(&path).unwrap());
    let countdown = CountdownEngine::with_clock(store.clone(), Arc::new(clock.clone()));
    let stock = StockEngine::with_parts(
        store.clone(),
        Arc::new(clock.clone()),
        Arc::new(FixedJitter(0.0)),
    );

    let left = countdown.read(window);
    assert_eq!(left.total_ms, window.num_milliseconds());
    assert_eq!(stock.read(&cfg), 6);

    let snap = admin::snapshot(&store);
    assert_eq!(snap.countdown_start, Some(clock_now(&clock)));
    assert_eq!(snap.stock_state.map(|s| s.initial), Some(20));
}

#[test]
fn test_hand_corrupted_rows_fall_back_to_defaults() {
    let backend = SqliteBackend::open_memory().unwrap();
    backend.set_raw(keys::COUNTDOWN_START, "yesterday-ish").unwrap();
    backend.set_raw(keys::STOCK_STATE, "null").unwrap();
    backend.set_raw(keys::LEADS, "{\"oops\": true}").unwrap();

    let store = Store::new(backend);
    let start = Utc.with_ymd_and_hms(2024, 10, 5, 8, 0, 0).unwrap();
    let clock = ManualClock::new(start);

    let countdown = CountdownEngine::with_clock(store.clone(), Arc::new(clock.clone()));
    let stock = StockEngine::with_parts(
        store.clone(),
        Arc::new(clock.clone()),
        Arc::new(FixedJitter(0.0)),
    );

    assert_eq!(
        countdown.read(Duration::hours(48)).total_ms,
        Duration::hours(48).num_milliseconds()
    );
    assert_eq!(stock.read(&StockConfig::new(20, 6, 17).unwrap()), 20);
    assert!(admin::snapshot(&store).leads.is_empty());
}

fn clock_now(clock: &ManualClock) -> chrono::DateTime<Utc> {
    use offerkit_core::Clock;
    clock.now()
}

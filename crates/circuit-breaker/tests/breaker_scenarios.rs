//! End-to-end breaker scenarios against a real state directory

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::fs;
use std::sync::Arc;
use warden_circuit_breaker::{
    BreakerState, CONFIG_FILE, CircuitBreaker, RiskConfigUpdate, RiskState, STATE_FILE,
    TradeContext,
};
use warden_clock::{Clock, ManualClock};
use warden_core::{Timestamp, TradeResult};

fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap()
}

fn context() -> TradeContext {
    TradeContext::new(dec!(100), dec!(1000))
}

fn init_logger() {
    let _ = env_logger::try_init();
}

#[test]
fn test_first_open_writes_default_documents() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Some(start()));

    let breaker = CircuitBreaker::open(dir.path(), clock).unwrap();

    assert!(dir.path().join(CONFIG_FILE).exists());
    assert!(dir.path().join(STATE_FILE).exists());
    assert_eq!(breaker.config().max_daily_loss_pct, dec!(5));

    let raw = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["cooldown_hours"], serde_json::json!(4.0));
}

#[test]
fn test_daily_loss_scenario_survives_winning_trade() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{"max_daily_loss_pct": 4.5, "max_trade_loss_pct": 50}"#,
    )
    .unwrap();
    let clock = ManualClock::new(Some(start()));
    let breaker = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
    breaker.set_daily_start_balance(dec!(1000)).unwrap();

    for pnl in [dec!(-20), dec!(-15), dec!(-10)] {
        breaker
            .record_trade_result(&TradeResult::new(pnl, dec!(200), clock.now()))
            .unwrap();
    }

    let denied = breaker.check_approval(&context());
    assert!(!denied.approved);
    assert!(denied.reason.contains("Daily loss"), "{}", denied.reason);
    assert!(breaker.state().trading_disabled);

    breaker
        .record_trade_result(&TradeResult::new(dec!(30), dec!(200), clock.now()))
        .unwrap();
    assert!(!breaker.check_approval(&context()).approved);
    assert_eq!(breaker.breaker_state(), BreakerState::Disabled);
}

#[test]
fn test_trip_survives_restart() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Some(start()));

    {
        let breaker = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
        breaker
            .record_trade_result(&TradeResult::new(dec!(-20), dec!(100), clock.now()))
            .unwrap();
        assert_eq!(breaker.breaker_state(), BreakerState::Disabled);
    }

    clock.advance(Duration::hours(1));
    let reopened = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
    assert_eq!(reopened.breaker_state(), BreakerState::Disabled);
    assert_eq!(reopened.state().disable_timestamp, Some(start()));
    assert!(!reopened.check_approval(&context()).approved);

    clock.advance(Duration::hours(3));
    assert!(reopened.check_approval(&context()).approved);

    let on_disk: RiskState =
        serde_json::from_str(&fs::read_to_string(dir.path().join(STATE_FILE)).unwrap()).unwrap();
    assert!(!on_disk.trading_disabled);
    assert!(on_disk.disable_timestamp.is_none());
}

#[test]
fn test_emergency_requires_manual_reset_across_restart() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Some(start()));

    CircuitBreaker::open(dir.path(), clock.clone())
        .unwrap()
        .emergency_stop("API keys rotated")
        .unwrap();

    clock.advance(Duration::days(3));
    let breaker = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
    assert_eq!(breaker.breaker_state(), BreakerState::Emergency);
    assert!(!breaker.check_approval(&context()).approved);

    breaker.manual_reset().unwrap();
    assert!(breaker.check_approval(&context()).approved);
}

#[test]
fn test_corrupt_state_falls_back_to_defaults() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(STATE_FILE), "{\"trading_disabled\": tru").unwrap();
    let clock = ManualClock::new(Some(start()));

    let breaker = CircuitBreaker::open(dir.path(), clock).unwrap();

    assert_eq!(breaker.breaker_state(), BreakerState::Enabled);
    assert!(dir.path().join(format!("{STATE_FILE}.corrupt")).exists());
    assert!(dir.path().join(STATE_FILE).exists());
}

#[test]
fn test_invalid_config_document_falls_back_to_defaults() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{"max_consecutive_losses": 0, "colour": "red"}"#,
    )
    .unwrap();
    let clock = ManualClock::new(Some(start()));

    let breaker = CircuitBreaker::open(dir.path(), clock).unwrap();
    assert_eq!(breaker.config().max_consecutive_losses, 5);
}

#[test]
fn test_config_update_is_persisted() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(Some(start()));

    let breaker = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
    breaker
        .update_config(&RiskConfigUpdate {
            cooldown_hours: Some(dec!(1)),
            ..Default::default()
        })
        .unwrap();

    let reopened = CircuitBreaker::open(dir.path(), clock).unwrap();
    assert_eq!(reopened.config().cooldown_hours, dec!(1));
}

#[test]
fn test_concurrent_results_are_all_counted() {
    init_logger();
    let clock = ManualClock::new(Some(start()));
    let breaker = Arc::new(
        CircuitBreaker::in_memory(
            warden_circuit_breaker::RiskConfig {
                max_consecutive_losses: 1000,
                ..Default::default()
            },
            clock.clone(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let breaker = breaker.clone();
            let now = clock.now();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    breaker
                        .record_trade_result(&TradeResult::new(dec!(-1), dec!(100), now))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let state = breaker.state();
    assert_eq!(state.consecutive_losses, 200);
    assert_eq!(state.daily_pnl, dec!(-200));
}

#[test]
fn test_disabled_document_without_timestamp_stays_disabled() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mut broken = RiskState::fresh(start().date_naive());
    broken.trading_disabled = true;
    fs::write(dir.path().join(STATE_FILE), serde_json::to_string(&broken).unwrap()).unwrap();
    let clock = ManualClock::new(Some(start()));

    let breaker = CircuitBreaker::open(dir.path(), clock.clone()).unwrap();
    assert_eq!(breaker.state().disable_timestamp, Some(start()));
    assert!(!breaker.check_approval(&context()).approved);

    let on_disk: RiskState =
        serde_json::from_str(&fs::read_to_string(dir.path().join(STATE_FILE)).unwrap()).unwrap();
    assert_eq!(on_disk.disable_timestamp, Some(start()));

    clock.advance(Duration::hours(4));
    assert!(breaker.check_approval(&context()).approved);
}

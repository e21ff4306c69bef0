//! Tests for cron parsing and timers.

use super::*;
use std::time::Duration;

#[test]
fn test_normalize_five_fields() {
    assert_eq!(normalize_cron("13 13 * * 6").unwrap(), "0 13 13 * * 6");
    assert_eq!(normalize_cron("  12 12  * * * ").unwrap(), "0 12 12 * * *");
}

#[test]
fn test_normalize_six_fields() {
    assert_eq!(normalize_cron("*/5 * * * * *").unwrap(), "*/5 * * * * *");
}

#[test]
fn test_normalize_rejects_other_lengths() {
    assert!(matches!(
        normalize_cron("* * * *"),
        Err(SchedulerError::InvalidSchedule { .. })
    ));
    assert!(normalize_cron("0 0 0 1 1 * 2030").is_err());
    assert!(normalize_cron("").is_err());
}

#[test]
fn test_parse_schedule() {
    let schedule = parse_schedule("12 12 * * *").unwrap();
    let next = schedule.upcoming(Utc).next().unwrap();
    assert_eq!(next.format("%H:%M:%S").to_string(), "12:12:00");
}

#[test]
fn test_parse_invalid_field() {
    let err = parse_schedule("61 * * * *").unwrap_err();
    assert!(err.to_string().starts_with("Invalid cron expression '61 * * * *'"));
}

#[tokio::test]
async fn test_timer_fires_and_cancels() {
    let count = Arc::new(AtomicU64::new(0));
    let counter = count.clone();
    let timer = CronTimer::start("tick", "* * * * * *", move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    })
    .unwrap();

    assert!(timer.is_running());
    assert_eq!(timer.name(), "tick");
    assert_eq!(timer.cron_expr(), "* * * * * *");
    assert!(timer.next_fire_time().is_some());

    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert!(count.load(Ordering::SeqCst) >= 1);
    assert_eq!(timer.fire_count(), count.load(Ordering::SeqCst));

    timer.cancel();
    assert!(!timer.is_running());
    assert!(timer.next_fire_time().is_none());

    let after_cancel = count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(count.load(Ordering::SeqCst), after_cancel);
}

#[tokio::test]
async fn test_invalid_timer_is_not_started() {
    let result = CronTimer::start("bad", "not a cron", || async {});
    assert!(matches!(result, Err(SchedulerError::InvalidSchedule { .. })));
}

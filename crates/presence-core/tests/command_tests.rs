//! Command channel behaviour as seen by the companion application


use presence_core::{CivilTime, PresenceConfig};
use test_utils::Harness;

fn harness() -> Harness {
    Harness::with_log(PresenceConfig::testing(), &["existing line"])
}

#[test]
fn test_set_time_round_trip() {
    let mut h = harness();
    h.command("SET_TIME:2024-08-30 15:30:00");
    h.time.advance(1_200);
    h.command("TIME");
    h.tick();

    let texts = h.texts();
    assert_eq!(texts[0], "Time set successfully to: 2024-08-30 15:30:00");
    let reply = texts[1];
    assert!(reply.starts_with("Current time: 2024-08-30 15:30:0"), "{reply}");
    let seconds: u32 = reply[reply.len() - 1..].parse().unwrap();
    assert!(seconds <= 2);
}

#[test]
fn test_invalid_set_time_keeps_clock() {
    let mut h = harness();
    h.time.set_time(5_000);
    h.command("TIME");
    h.command("SET_TIME:2024-13-40 99:99:99");
    h.command("TIME");
    h.tick();

    assert_eq!(
        h.texts(),
        vec![
            "Current time: 2024-08-30 12:00:05",
            "ERROR: Invalid time values",
            "Current time: 2024-08-30 12:00:05",
        ]
    );
    assert_eq!(h.app.clock().civil(), "2024-08-30 12:00:05".parse::<CivilTime>().unwrap());
}

#[test]
fn test_clock_keeps_running_through_month_end() {
    let mut h = harness();
    h.command("SET_TIME:2024-02-29 23:59:58");
    h.time.advance(3_000);
    h.command("TIME");
    h.tick();
    assert_eq!(h.texts()[1], "Current time: 2024-03-01 00:00:01");
}

#[test]
fn test_clear_then_dump_reports_fresh_log() {
    let mut h = harness();
    h.command("CLEAR");
    h.command("DUMP");
    for _ in 0..10 {
        h.time.advance(100);
        h.tick();
    }

    let texts = h.texts();
    assert_eq!(texts[0], "LOG_CLEARED");
    assert_eq!(texts[1], "DUMP_START");
    assert!(texts[2].starts_with("=== Log cleared at "));
    assert_eq!(texts[3], "DUMP_COMPLETE");
}

#[test]
fn test_clear_aborts_running_dump() {
    let mut h = Harness::with_log(PresenceConfig::testing(), &["a", "b", "c"]);
    h.command("DUMP");
    for _ in 0..2 {
        h.time.advance(100);
        h.tick();
    }
    assert!(h.app.is_dumping());

    h.command("CLEAR");
    assert!(!h.app.is_dumping());
    h.run_for(500, 50);

    let texts = h.texts();
    assert_eq!(texts, vec!["DUMP_START", "a", "LOG_CLEARED"]);
}

#[test]
fn test_commands_while_disconnected_are_dropped() {
    let mut h = harness();
    h.disconnect();
    h.command("STATUS");
    h.command("TIME");
    h.tick();
    assert!(h.texts().is_empty());
}

#[test]
fn test_status_reflects_connection() {
    let mut h = harness();
    h.command("STATUS");
    h.tick();
    assert_eq!(h.texts(), vec!["STATUS: Heap=100000, Connected=1"]);
}

//! End-to-end dump lifecycle over a paced transmitter
//!
//! The harness ticks the app every 10ms like the firmware loop and records
//! when each notification leaves, so spacing guarantees can be checked on
//! the wire rather than on internal calls.


use presence_core::{
    DumpTick, FrameReassembler, Observation, PresenceConfig, ReceivedMessage, TransferState,
};
use test_utils::Harness;

const LINES: [&str; 3] = [
    "2024-08-30 12:00:01 - Wi-Fi: alpha (BSSID 0011223344556677) - RSSI -40 dBm",
    "2024-08-30 12:00:02 - Wi-Fi: beta (BSSID 8899aabbccddeeff) - RSSI -52 dBm",
    "2024-08-30 12:00:03 - Wi-Fi: gamma (BSSID 0123456789abcdef) - RSSI -67 dBm",
];

const TICK_MS: u64 = 10;

fn paced_harness(lines: &[&str]) -> Harness {
    Harness::with_log(PresenceConfig::default(), lines)
}

#[test]
fn test_three_line_dump_is_spaced_and_completed() {
    let mut h = paced_harness(&LINES);
    h.command("DUMP");
    h.run_for(1_000, TICK_MS);

    assert_eq!(
        h.texts(),
        vec!["DUMP_START", LINES[0], LINES[1], LINES[2], "DUMP_COMPLETE"]
    );

    let line_times: Vec<u64> = h
        .transcript
        .iter()
        .filter(|(_, text)| LINES.contains(&text.as_str()))
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(line_times.len(), 3);
    for pair in line_times.windows(2) {
        assert!(pair[1] - pair[0] >= 100, "lines too close: {pair:?}");
    }
    assert!(!h.app.is_dumping());
}

#[test]
fn test_disconnect_mid_dump_closes_session() {
    let mut h = paced_harness(&LINES);
    h.command("DUMP");
    while !h.texts().contains(&LINES[0]) {
        h.run_for(TICK_MS, TICK_MS);
    }

    h.disconnect();
    assert!(!h.app.is_dumping());
    assert_eq!(h.app.transmitter().state(), TransferState::Idle);

    let delivered = h.transcript.len();
    h.run_for(500, TICK_MS);
    assert_eq!(h.transcript.len(), delivered);

    h.reconnect();
    h.command("DUMP");
    h.run_for(1_000, TICK_MS);

    // The reconnection marker was appended after the original lines
    let after: Vec<&str> = h.texts()[delivered..].to_vec();
    assert_eq!(after.len(), 6);
    assert_eq!(after[..4], ["DUMP_START", LINES[0], LINES[1], LINES[2]]);
    assert!(after[4].starts_with("BLE device connected - "));
    assert_eq!(after[5], "DUMP_COMPLETE");
}

#[test]
fn test_second_dump_request_does_not_restart_session() {
    let mut h = paced_harness(&LINES);
    h.command("DUMP");
    h.run_for(100, TICK_MS);
    h.command("DUMP");
    h.run_for(1_000, TICK_MS);

    let texts = h.texts();
    assert_eq!(texts.iter().filter(|t| **t == "DUMP_START").count(), 1);
    assert_eq!(texts.iter().filter(|t| **t == LINES[0]).count(), 1);
    assert!(texts.contains(&"ERROR: Dump already in progress"));
    assert_eq!(texts.last(), Some(&"DUMP_COMPLETE"));
}

#[test]
fn test_long_lines_are_fragmented_and_reassembled() {
    let long = format!("2024-08-30 12:00:04 - Wi-Fi: {} - RSSI -70 dBm", "x".repeat(400));
    let mut h = paced_harness(&[LINES[0], &long, LINES[1]]);
    h.command("DUMP");
    h.run_for(3_000, TICK_MS);

    let mut reassembler = FrameReassembler::new();
    let messages: Vec<String> = h
        .transcript
        .iter()
        .filter_map(|(_, payload)| reassembler.push(payload.as_bytes()))
        .map(|message| match message {
            ReceivedMessage::Complete(text) => text,
            other => panic!("unexpected {other:?}"),
        })
        .collect();

    assert_eq!(
        messages,
        vec!["DUMP_START", LINES[0], long.as_str(), LINES[1], "DUMP_COMPLETE"]
    );
    assert!(h.texts().contains(&"START:3"));
}

#[test]
fn test_blank_lines_are_skipped() {
    let mut h = paced_harness(&[LINES[0], "", "   ", LINES[1]]);
    h.command("DUMP");
    h.run_for(1_000, TICK_MS);
    assert_eq!(
        h.texts(),
        vec!["DUMP_START", LINES[0], LINES[1], "DUMP_COMPLETE"]
    );
}

#[test]
fn test_live_events_are_not_forwarded_during_dump() {
    let mut h = paced_harness(&LINES);
    h.command("DUMP");
    h.run_for(TICK_MS, TICK_MS);

    let now = h.now();
    h.app.handle_event(
        presence_core::Event::Observation(Observation::ble("de:ad:be:ef:00:01", -80, None)),
        now,
        &h.sink,
    );
    h.run_for(1_000, TICK_MS);

    assert!(!h.texts().iter().any(|t| t.contains("BLE Device")));
    assert!(h.app.storage().lines().any(|l| l.contains("BLE Device")));
}

#[test]
fn test_live_events_resume_after_dump() {
    let mut h = paced_harness(&LINES[..1]);
    h.command("DUMP");
    h.run_for(500, TICK_MS);
    assert_eq!(h.texts().last(), Some(&"DUMP_COMPLETE"));

    let now = h.now();
    h.app.handle_event(
        presence_core::Event::Observation(Observation::wifi("delta", "12:34:56:78:9a:bc", -30)),
        now,
        &h.sink,
    );
    h.run_for(100, TICK_MS);
    assert!(h.texts().last().unwrap().contains("Wi-Fi: delta"));
}

#[test]
fn test_dump_tick_is_inactive_without_session() {
    let mut h = paced_harness(&LINES);
    let report = h.tick();
    assert_eq!(report.dump, DumpTick::Inactive);
}

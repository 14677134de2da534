use std::sync::Arc;

use print_telemetry::error::{ParseError, TelemetryError};
use print_telemetry::feedrate::{command_code, parse_parameter};
use print_telemetry::{GcodeFeedrateTracker, SharedState};

fn tracker() -> (Arc<SharedState>, GcodeFeedrateTracker) {
    let state = Arc::new(SharedState::new());
    (state.clone(), GcodeFeedrateTracker::new(state))
}

#[test]
fn test_motion_feedrate_mid_line() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("G1 F1500.1 X5 Y8");
    assert_eq!(state.snapshot().feedrate, 1500.1);
}

#[test]
fn test_feedrate_as_last_token() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("G1 F1200");
    assert_eq!(state.snapshot().feedrate, 1200.0);

    tracker.on_gcode_sent("G0 X1 Y2 F9000");
    assert_eq!(state.snapshot().feedrate, 9000.0);
}

#[test]
fn test_feedrate_percentage_override() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("M220 S50");
    let snapshot = state.snapshot();
    assert_eq!(snapshot.feedrate_percent, 50.0);
    assert_eq!(snapshot.feedrate, 1.0);
}

#[test]
fn test_all_motion_codes_update_feedrate() {
    let (state, tracker) = tracker();
    for (line, expected) in [
        ("G0 F100", 100.0),
        ("G1 F200", 200.0),
        ("G2 X1 Y1 I1 J0 F300", 300.0),
        ("G3 X1 Y1 I1 J0 F400", 400.0),
    ] {
        tracker.on_gcode_sent(line);
        assert_eq!(state.snapshot().feedrate, expected, "{}", line);
    }
}

#[test]
fn test_malformed_values_keep_last_good_value() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("G1 F1800");
    tracker.on_gcode_sent("G1 F");
    tracker.on_gcode_sent("G1 Fabc X1");
    tracker.on_gcode_sent("G1 F1e999");
    assert_eq!(state.snapshot().feedrate, 1800.0);

    tracker.on_gcode_sent("M220 S75");
    tracker.on_gcode_sent("M220 S");
    tracker.on_gcode_sent("M220");
    assert_eq!(state.snapshot().feedrate_percent, 75.0);
}

#[test]
fn test_apply_gcode_reports_parse_errors() {
    let (state, tracker) = tracker();
    assert!(tracker.apply_gcode("G1 F2400").unwrap());
    assert!(!tracker.apply_gcode("G1 X10").unwrap());
    assert!(!tracker.apply_gcode("M104 S210").unwrap());

    let err = tracker.apply_gcode("M220 Sfast").unwrap_err();
    assert!(matches!(
        err,
        TelemetryError::Parse(ParseError::InvalidNumber { letter: 'S', .. })
    ));
    assert!(matches!(
        tracker.apply_gcode("G1 F"),
        Err(TelemetryError::Parse(ParseError::MissingValue { letter: 'F', .. }))
    ));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.feedrate, 2400.0);
    assert_eq!(snapshot.feedrate_percent, 1.0);
}

#[test]
fn test_other_commands_are_ignored() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("G28 F500");
    tracker.on_gcode_sent("M104 S210");
    tracker.on_gcode_sent("G10 F300");
    tracker.on_gcode_sent("");
    tracker.on_gcode_sent("; G1 F999");
    tracker.on_gcode_sent("G1 X10 Y10");
    let snapshot = state.snapshot();
    assert_eq!(snapshot.feedrate, 1.0);
    assert_eq!(snapshot.feedrate_percent, 1.0);
}

#[test]
fn test_comments_and_case() {
    let (state, tracker) = tracker();
    tracker.on_gcode_sent("g1 x5 f2400 ; F9999 in comment");
    assert_eq!(state.snapshot().feedrate, 2400.0);
}

#[test]
fn test_parse_parameter_results() {
    assert_eq!(parse_parameter("G1 F1500.1 X5", 'F'), Ok(Some(1500.1)));
    assert_eq!(parse_parameter("G1 X5", 'F'), Ok(None));
    assert_eq!(
        parse_parameter("G1 F", 'F'),
        Err(ParseError::MissingValue {
            letter: 'F',
            command: "G1 F".to_string()
        })
    );
    assert_eq!(
        parse_parameter("M220 Sfast", 'S'),
        Err(ParseError::InvalidNumber {
            letter: 'S',
            token: "Sfast".to_string()
        })
    );
    assert_eq!(command_code("  m220 S50"), Some("M220".to_string()));
    assert_eq!(command_code("   "), None);
}

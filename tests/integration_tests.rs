// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for XLSTEP
//!
//! These tests drive the assembled application with synthetic control
//! input and synthetic time, and observe the logical output edges - the
//! same surface a CV converter would see.

use std::time::{Duration, Instant};

use xlstep::app::App;
use xlstep::config::RigConfig;
use xlstep::control::{Color, LedSink};
use xlstep::output::{OutputEvent, OutputSink};

struct RecordingSink(Vec<OutputEvent>);

impl OutputSink for RecordingSink {
    fn send(&mut self, event: OutputEvent) {
        self.0.push(event);
    }
}

struct RecordingLeds(Vec<(u8, Color)>);

impl LedSink for RecordingLeds {
    fn set_led(&mut self, led: u8, color: Color) {
        self.0.push((led, color));
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// App at 120 BPM (500ms interval) with recording sinks, already running.
fn fixture() -> (App, RecordingSink, RecordingLeds, Instant) {
    let t0 = Instant::now();
    let mut config = RigConfig::default();
    config.sequencer.tempo = 120.0;
    let mut app = App::new(&config, t0).unwrap();
    let mut leds = RecordingLeds(Vec::new());
    app.start(t0, &mut leds);
    (app, RecordingSink(Vec::new()), leds, t0)
}

/// Press a button control (value 127) at the given CC number.
fn press(app: &mut App, cc: u8, at: Instant, out: &mut RecordingSink, leds: &mut RecordingLeds) {
    app.handle_control(0, cc, 127, at, out, leds);
}

#[test]
fn test_skip_and_reset_loop_order() {
    let (mut app, mut out, mut leds, t0) = fixture();

    // Step 1 -> SKIP (one press on its step-mode button, CC 33).
    press(&mut app, 33, t0, &mut out, &mut leds);
    // Step 3 -> RESET (two presses, CC 35).
    press(&mut app, 35, t0, &mut out, &mut leds);
    press(&mut app, 35, t0, &mut out, &mut leds);

    // The loop lands only on the played steps 0 and 2: the skip is passed
    // over and the reset marker bounces the cursor back to step 0.
    let mut visited = Vec::new();
    for n in 1..=6 {
        app.poll(t0 + ms(500 * n), &mut out, &mut leds);
        visited.push(app.engine().current_step());
    }
    assert_eq!(visited, vec![2, 0, 2, 0, 2, 0]);

    // Every wrap back to step 0 fires the end-of-sequence pulse.
    let eos = out
        .0
        .iter()
        .filter(|e| **e == OutputEvent::EndOfSequenceOn)
        .count();
    assert_eq!(eos, 3);
}

#[test]
fn test_fast_polling_has_no_drift() {
    let (mut app, mut out, mut leds, t0) = fixture();

    // Poll on an awkward 7ms grid for ten intervals. Boundary spacing must
    // come out at exactly one interval each because the clock advances its
    // anchor by the interval, never to the polling instant.
    let mut elapsed = Duration::ZERO;
    while elapsed < ms(5000) {
        elapsed += Duration::from_millis(7);
        app.poll(t0 + elapsed, &mut out, &mut leds);
    }
    let gate_ons = out.0.iter().filter(|e| **e == OutputEvent::GateOn).count();
    assert_eq!(gate_ons, 10);
}

#[test]
fn test_gate_pulse_and_tie_end_to_end() {
    let (mut app, mut out, mut leds, t0) = fixture();

    // Step 1 -> TIE via its gate-mode button (CC 25).
    press(&mut app, 25, t0, &mut out, &mut leds);

    // First tick lands on step 1 (tie): gate opens, trigger fires.
    app.poll(t0 + ms(500), &mut out, &mut leds);
    // Drain the rest of the interval: only the trigger's falling edge may
    // appear; the tied gate must not close.
    app.poll(t0 + ms(999), &mut out, &mut leds);
    assert!(out.0.contains(&OutputEvent::GateOn));
    assert!(out.0.contains(&OutputEvent::TriggerOff));
    assert!(!out.0.contains(&OutputEvent::GateOff));
    out.0.clear();

    // Second tick moves onto step 2, a plain gate: the open gate carries
    // over with no new edge and no retrigger, but the 0.9 duty schedules
    // a close inside this interval.
    app.poll(t0 + ms(1000), &mut out, &mut leds);
    assert!(!out.0.contains(&OutputEvent::GateOn));
    assert!(!out.0.contains(&OutputEvent::TriggerOn));
    assert!(!out.0.contains(&OutputEvent::GateOff));

    // The close lands at 90% of the interval after the second boundary.
    app.poll(t0 + ms(1000 + 460), &mut out, &mut leds);
    assert!(out.0.contains(&OutputEvent::GateOff));
}

#[test]
fn test_knob_value_flows_to_output() {
    let (mut app, mut out, mut leds, t0) = fixture();

    // Pitch knob of step 1 (CC 1) and its lane-0 aux knob (CC 9).
    app.handle_control(0, 1, 72, t0, &mut out, &mut leds);
    app.handle_control(0, 9, 33, t0, &mut out, &mut leds);

    app.poll(t0 + ms(500), &mut out, &mut leds);
    assert!(out.0.contains(&OutputEvent::NoteOn(72)));
    assert!(out.0.contains(&OutputEvent::Cv { lane: 0, value: 33 }));
    // Unset lanes fall back to the configured default of 0.
    assert!(out.0.contains(&OutputEvent::Cv { lane: 1, value: 0 }));
}

#[test]
fn test_tap_tempo_retimes_the_loop() {
    let (mut app, mut out, mut leds, t0) = fixture();
    let tap_cc = 41;

    // Four taps 250ms apart: 240 BPM.
    for n in 0..4u64 {
        press(&mut app, tap_cc, t0 + ms(250 * n), &mut out, &mut leds);
    }
    assert!((app.clock().bpm() - 240.0).abs() < 0.1);

    // The next boundary after the pending one arrives 250ms later.
    app.poll(t0 + ms(500), &mut out, &mut leds);
    let before = app.engine().current_step();
    app.poll(t0 + ms(750), &mut out, &mut leds);
    assert_ne!(app.engine().current_step(), before);
}

#[test]
fn test_stale_taps_do_not_retime() {
    let (mut app, mut out, mut leds, t0) = fixture();
    let tap_cc = 41;

    press(&mut app, tap_cc, t0, &mut out, &mut leds);
    press(&mut app, tap_cc, t0 + ms(250), &mut out, &mut leds);
    // A gap beyond the staleness threshold clears the window; the two
    // later taps never fill it.
    press(&mut app, tap_cc, t0 + ms(4000), &mut out, &mut leds);
    press(&mut app, tap_cc, t0 + ms(4250), &mut out, &mut leds);
    assert_eq!(app.clock().bpm(), 120.0);
}

#[test]
fn test_stop_step_freezes_loop_end_to_end() {
    let (mut app, mut out, mut leds, t0) = fixture();

    // Step 1 -> STOP (three presses on CC 33).
    for _ in 0..3 {
        press(&mut app, 33, t0, &mut out, &mut leds);
    }

    for n in 1..=4 {
        app.poll(t0 + ms(500 * n), &mut out, &mut leds);
        assert_eq!(app.engine().current_step(), 1);
    }
}

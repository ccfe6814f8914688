// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scheduled on/off signal pairs.
//!
//! A [`Pulse`] emits its rising edge synchronously and schedules the
//! falling edge on the clock. Trigger, gate and end-of-sequence outputs all
//! go through the same primitive; only the width differs.

use std::time::Duration;

use super::Timer;
use crate::output::{OutputEvent, OutputSink};
use crate::timing::Clock;

/// Width of the fixed-length pulses (trigger, end-of-sequence)
pub const PULSE_WIDTH: Duration = Duration::from_millis(10);

/// An on-edge plus a clock-scheduled off-edge.
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    on: OutputEvent,
    off: Timer,
    width: Duration,
}

impl Pulse {
    /// Per-step trigger pulse
    pub fn trigger() -> Self {
        Self {
            on: OutputEvent::TriggerOn,
            off: Timer::TriggerOff,
            width: PULSE_WIDTH,
        }
    }

    /// End-of-sequence pulse, fired when the cursor wraps
    pub fn end_of_sequence() -> Self {
        Self {
            on: OutputEvent::EndOfSequenceOn,
            off: Timer::EndOfSequenceOff,
            width: PULSE_WIDTH,
        }
    }

    /// Gate pulse open for `width` of the current interval
    pub fn gate(width: Duration) -> Self {
        Self {
            on: OutputEvent::GateOn,
            off: Timer::GateOff,
            width,
        }
    }

    /// Pitch pulse releasing after `width`
    pub fn note(note: u8, width: Duration) -> Self {
        Self {
            on: OutputEvent::NoteOn(note),
            off: Timer::NoteOff(note),
            width,
        }
    }

    /// Emit the on-edge now and schedule the off-edge.
    pub fn fire(&self, clock: &mut Clock<Timer>, sink: &mut dyn OutputSink) {
        sink.send(self.on);
        self.schedule_off(clock);
    }

    /// Schedule only the off-edge. Used when the signal is already high and
    /// re-emitting the on-edge would be a spurious retrigger.
    pub fn schedule_off(&self, clock: &mut Clock<Timer>) {
        clock.schedule_once(self.width, self.off);
    }
}

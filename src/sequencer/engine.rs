// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The step sequencing engine.
//!
//! Owns the step slots, the cursor and the gate state. On every clock tick
//! the engine resolves the next step through the step-mode state machine,
//! snapshots the slot's values and emits timed output through the clock and
//! the output sink. All methods run on the polling thread; out-of-range
//! step indices are programming errors, not runtime faults.

use std::time::Instant;

use tracing::debug;

use super::modes::{GateMode, StepMode};
use super::pulse::Pulse;
use super::Timer;
use crate::output::{OutputEvent, OutputSink};
use crate::timing::Clock;

/// Auxiliary control values carried per step (CV lanes)
pub const AUX_VALUES: usize = 3;

/// One step slot: mode selectors plus the last values received from the
/// step's physical controls. Values stay `None` until the control first
/// reports.
#[derive(Debug, Clone, Copy, Default)]
struct Step {
    step_mode: StepMode,
    gate_mode: GateMode,
    note: Option<u8>,
    aux: [Option<u8>; AUX_VALUES],
}

/// Step sequencer engine.
#[derive(Debug)]
pub struct StepSequencer {
    steps: Vec<Step>,
    current_step: usize,
    is_gate_active: bool,
    open_note: Option<u8>,
    unset_value: u8,
}

impl StepSequencer {
    /// Create a sequencer with `total_steps` slots, all in the default
    /// modes. `unset_value` substitutes for controls that have never
    /// reported a value.
    pub fn new(total_steps: usize, unset_value: u8) -> Self {
        assert!(total_steps > 0, "sequencer needs at least one step");
        Self {
            steps: vec![Step::default(); total_steps],
            current_step: 0,
            is_gate_active: false,
            open_note: None,
            unset_value: unset_value & 0x7F,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_gate_active(&self) -> bool {
        self.is_gate_active
    }

    pub fn step_mode(&self, step: usize) -> StepMode {
        self.steps[step].step_mode
    }

    pub fn gate_mode(&self, step: usize) -> GateMode {
        self.steps[step].gate_mode
    }

    pub fn has_note_value(&self, step: usize) -> bool {
        self.steps[step].note.is_some()
    }

    pub fn has_aux_value(&self, step: usize, lane: usize) -> bool {
        self.steps[step].aux[lane].is_some()
    }

    /// Record a new pitch value for the step
    pub fn set_note_value(&mut self, step: usize, value: u8) {
        self.steps[step].note = Some(value & 0x7F);
    }

    /// Record a new auxiliary value for the step
    pub fn set_aux_value(&mut self, step: usize, lane: usize, value: u8) {
        self.steps[step].aux[lane] = Some(value & 0x7F);
    }

    /// Cycle the step mode to the next table entry
    pub fn cycle_step_mode(&mut self, step: usize) -> StepMode {
        let mode = self.steps[step].step_mode.next();
        self.steps[step].step_mode = mode;
        debug!(step, ?mode, "step mode changed");
        mode
    }

    /// Cycle the gate mode to the next table entry. Refused (returns
    /// `None`) while the step is effectively unplayed, since a gate on a
    /// step that never sounds is meaningless.
    pub fn cycle_gate_mode(&mut self, step: usize) -> Option<GateMode> {
        if !self.is_step_played(step) {
            return None;
        }
        let mode = self.steps[step].gate_mode.next();
        self.steps[step].gate_mode = mode;
        debug!(step, ?mode, "gate mode changed");
        Some(mode)
    }

    fn first_reset_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.step_mode == StepMode::Reset)
    }

    /// Whether the step belongs to the active loop. The sequence logically
    /// ends at the first reset marker: every step after it is unplayed no
    /// matter what its own mode says.
    pub fn is_step_played(&self, step: usize) -> bool {
        match self.first_reset_index() {
            Some(reset) if step > reset => false,
            _ => self.steps[step].step_mode.played(),
        }
    }

    /// Resolve the step the cursor moves to from `from`.
    ///
    /// Iterates at most `total_steps` times so a sequence of nothing but
    /// skips terminates by freezing on the starting step.
    pub fn next_step(&self, from: usize) -> usize {
        let total = self.steps.len();
        let mut current = from;
        for _ in 0..total {
            if self.steps[current].step_mode == StepMode::Stop {
                return current;
            }
            let next = (current + 1) % total;
            match self.steps[next].step_mode {
                StepMode::Reset => {
                    return self
                        .steps
                        .iter()
                        .position(|s| s.step_mode.played())
                        .unwrap_or(current);
                }
                StepMode::Skip => current = next,
                StepMode::Step | StepMode::Stop => return next,
            }
        }
        from
    }

    /// Advance the cursor and emit the step's output.
    ///
    /// `explicit` bypasses next-step resolution (used by [`Self::reset`]
    /// and manual jumps). A target at or before the previous cursor counts
    /// as a wrap and fires the end-of-sequence pulse.
    pub fn step(
        &mut self,
        explicit: Option<usize>,
        clock: &mut Clock<Timer>,
        sink: &mut dyn OutputSink,
    ) {
        let target = explicit.unwrap_or_else(|| self.next_step(self.current_step));
        if target <= self.current_step {
            Pulse::end_of_sequence().fire(clock, sink);
        }
        self.current_step = target;

        let slot = self.steps[target];
        let duty = slot.gate_mode.duty_cycle();
        let note = slot.note.unwrap_or(self.unset_value);

        if slot.gate_mode != GateMode::Silent {
            let width = if duty > 0.0 && duty < 1.0 {
                Some(clock.interval().mul_f64(duty))
            } else {
                None
            };
            self.emit_note(note, width, clock, sink);
            for (lane, value) in slot.aux.iter().enumerate() {
                sink.send(OutputEvent::Cv {
                    lane,
                    value: value.unwrap_or(self.unset_value),
                });
            }
        }
        self.emit_gate(duty, clock, sink);
    }

    /// Dispatch a timer scheduled by an earlier step. Gate and note closes
    /// are idempotent: a close for a signal that is already low does
    /// nothing beyond the (harmless) downstream edge.
    pub fn handle_timer(&mut self, timer: Timer, sink: &mut dyn OutputSink) {
        match timer {
            Timer::TriggerOff => sink.send(OutputEvent::TriggerOff),
            Timer::GateOff => {
                if self.is_gate_active {
                    self.is_gate_active = false;
                    sink.send(OutputEvent::GateOff);
                }
            }
            Timer::NoteOff(note) => {
                sink.send(OutputEvent::NoteOff(note));
                if self.open_note == Some(note) {
                    self.open_note = None;
                }
            }
            Timer::EndOfSequenceOff => sink.send(OutputEvent::EndOfSequenceOff),
            Timer::BeatBlinkOff => {}
        }
    }

    /// Close any open gate and note, re-anchor the clock and jump to the
    /// first slot unconditionally.
    pub fn reset(&mut self, now: Instant, clock: &mut Clock<Timer>, sink: &mut dyn OutputSink) {
        self.silence(sink);
        clock.restart(now);
        self.step(Some(0), clock, sink);
    }

    /// Force the gate closed and release any held note.
    pub fn silence(&mut self, sink: &mut dyn OutputSink) {
        if self.is_gate_active {
            self.is_gate_active = false;
            sink.send(OutputEvent::GateOff);
        }
        if let Some(note) = self.open_note.take() {
            sink.send(OutputEvent::NoteOff(note));
        }
    }

    fn emit_note(
        &mut self,
        note: u8,
        width: Option<std::time::Duration>,
        clock: &mut Clock<Timer>,
        sink: &mut dyn OutputSink,
    ) {
        match self.open_note {
            // Same pitch held over from a tie: no re-edge.
            Some(prev) if prev == note => {}
            // Legato change: new pitch sounds before the old one releases.
            Some(prev) => {
                sink.send(OutputEvent::NoteOn(note));
                sink.send(OutputEvent::NoteOff(prev));
                self.open_note = Some(note);
            }
            None => {
                sink.send(OutputEvent::NoteOn(note));
                self.open_note = Some(note);
            }
        }
        if let Some(width) = width {
            Pulse::note(note, width).schedule_off(clock);
        }
    }

    fn emit_gate(&mut self, duty: f64, clock: &mut Clock<Timer>, sink: &mut dyn OutputSink) {
        if duty <= 0.0 {
            self.silence(sink);
            return;
        }
        let width = if duty < 1.0 {
            Some(clock.interval().mul_f64(duty))
        } else {
            None
        };
        if self.is_gate_active {
            // Already open (tie carrying over): no gate edge, no retrigger,
            // but a finite duty still closes the gate later this interval.
            if let Some(width) = width {
                Pulse::gate(width).schedule_off(clock);
            }
        } else {
            self.is_gate_active = true;
            match width {
                Some(width) => Pulse::gate(width).fire(clock, sink),
                None => sink.send(OutputEvent::GateOn),
            }
            Pulse::trigger().fire(clock, sink);
        }
    }
}

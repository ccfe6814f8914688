// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Logical sequencer output and the MIDI adapter.
//!
//! The engine emits discrete, idempotent-safe edges ([`OutputEvent`])
//! through the [`OutputSink`] trait. [`MidiOutputAdapter`] translates those
//! edges into MIDI note and CC messages shaped for a CV.OCD MIDI-to-CV
//! converter; tests substitute a recording sink and never touch hardware.

pub mod cv;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::midi::{messages, MidiOutput};

/// Number of auxiliary CV lanes emitted per step
pub const CV_LANES: usize = 3;

/// A discrete output edge emitted by the sequencer.
///
/// Edges are idempotent-safe: a downstream converter may receive a close
/// edge for a signal that is already closed and must treat it as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// Rising edge of the per-step trigger pulse
    TriggerOn,
    /// Falling edge of the per-step trigger pulse
    TriggerOff,
    /// Gate opened
    GateOn,
    /// Gate closed
    GateOff,
    /// Pitch output for the step, 0-127
    NoteOn(u8),
    /// Pitch released
    NoteOff(u8),
    /// Auxiliary CV lane update
    Cv { lane: usize, value: u8 },
    /// Rising edge of the end-of-sequence pulse
    EndOfSequenceOn,
    /// Falling edge of the end-of-sequence pulse
    EndOfSequenceOff,
}

/// Consumer of sequencer output edges.
///
/// Implementations must not block; transport problems are handled inside
/// the adapter (reconnect on a later send), never surfaced to the engine.
pub trait OutputSink {
    fn send(&mut self, event: OutputEvent);
}

/// MIDI channel, note and CC assignments for the downstream converter.
///
/// The defaults match a CV.OCD profile with the gate sockets listening on
/// fixed notes and the CV sockets on CCs 1-3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputAssignments {
    /// MIDI channel (0-15)
    #[serde(default)]
    pub channel: u8,
    /// Velocity used for all note-on messages
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// Note driving the gate socket
    #[serde(default = "default_gate_note")]
    pub gate_note: u8,
    /// Note driving the trigger socket
    #[serde(default = "default_trigger_note")]
    pub trigger_note: u8,
    /// Note driving the end-of-sequence socket
    #[serde(default = "default_end_note")]
    pub end_note: u8,
    /// CC numbers for the auxiliary CV lanes
    #[serde(default = "default_cv_controllers")]
    pub cv_controllers: [u8; CV_LANES],
}

fn default_velocity() -> u8 {
    127
}
fn default_gate_note() -> u8 {
    36
}
fn default_trigger_note() -> u8 {
    37
}
fn default_end_note() -> u8 {
    38
}
fn default_cv_controllers() -> [u8; CV_LANES] {
    [1, 2, 3]
}

impl Default for OutputAssignments {
    fn default() -> Self {
        Self {
            channel: 0,
            velocity: default_velocity(),
            gate_note: default_gate_note(),
            trigger_note: default_trigger_note(),
            end_note: default_end_note(),
            cv_controllers: default_cv_controllers(),
        }
    }
}

/// Translates output edges into MIDI bytes on a [`MidiOutput`].
///
/// Send failures are logged and swallowed; the port implementation retries
/// its connection on the next send.
pub struct MidiOutputAdapter<M> {
    port: M,
    assign: OutputAssignments,
}

impl<M: MidiOutput> MidiOutputAdapter<M> {
    pub fn new(port: M, assign: OutputAssignments) -> Self {
        Self { port, assign }
    }

    fn note_on(&mut self, note: u8) {
        let msg = [
            messages::NOTE_ON | (self.assign.channel & 0x0F),
            note & 0x7F,
            self.assign.velocity & 0x7F,
        ];
        self.deliver(&msg);
    }

    fn note_off(&mut self, note: u8) {
        let msg = [
            messages::NOTE_OFF | (self.assign.channel & 0x0F),
            note & 0x7F,
            0,
        ];
        self.deliver(&msg);
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        let msg = [
            messages::CONTROL_CHANGE | (self.assign.channel & 0x0F),
            controller & 0x7F,
            value & 0x7F,
        ];
        self.deliver(&msg);
    }

    fn deliver(&mut self, msg: &[u8]) {
        if let Err(e) = self.port.send(msg) {
            warn!("dropping output message after send failure: {e:#}");
        }
    }
}

impl<M: MidiOutput> OutputSink for MidiOutputAdapter<M> {
    fn send(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::TriggerOn => self.note_on(self.assign.trigger_note),
            OutputEvent::TriggerOff => self.note_off(self.assign.trigger_note),
            OutputEvent::GateOn => self.note_on(self.assign.gate_note),
            OutputEvent::GateOff => self.note_off(self.assign.gate_note),
            OutputEvent::NoteOn(note) => self.note_on(note),
            OutputEvent::NoteOff(note) => self.note_off(note),
            OutputEvent::Cv { lane, value } => {
                if let Some(&controller) = self.assign.cv_controllers.get(lane) {
                    self.control_change(controller, value);
                }
            }
            OutputEvent::EndOfSequenceOn => self.note_on(self.assign.end_note),
            OutputEvent::EndOfSequenceOff => self.note_off(self.assign.end_note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    /// Mock MIDI output recording raw bytes
    struct MockMidiOutput {
        messages: Vec<Vec<u8>>,
    }

    impl MockMidiOutput {
        fn new() -> Self {
            Self {
                messages: Vec::new(),
            }
        }
    }

    impl MidiOutput for MockMidiOutput {
        fn send(&mut self, message: &[u8]) -> Result<()> {
            self.messages.push(message.to_vec());
            Ok(())
        }
    }

    fn adapter() -> MidiOutputAdapter<MockMidiOutput> {
        MidiOutputAdapter::new(MockMidiOutput::new(), OutputAssignments::default())
    }

    #[test]
    fn test_gate_edges_use_gate_note() {
        let mut out = adapter();
        out.send(OutputEvent::GateOn);
        out.send(OutputEvent::GateOff);
        assert_eq!(out.port.messages[0], vec![0x90, 36, 127]);
        assert_eq!(out.port.messages[1], vec![0x80, 36, 0]);
    }

    #[test]
    fn test_trigger_and_end_notes() {
        let mut out = adapter();
        out.send(OutputEvent::TriggerOn);
        out.send(OutputEvent::EndOfSequenceOn);
        assert_eq!(out.port.messages[0], vec![0x90, 37, 127]);
        assert_eq!(out.port.messages[1], vec![0x90, 38, 127]);
    }

    #[test]
    fn test_note_value_passes_through() {
        let mut out = adapter();
        out.send(OutputEvent::NoteOn(72));
        out.send(OutputEvent::NoteOff(72));
        assert_eq!(out.port.messages[0], vec![0x90, 72, 127]);
        assert_eq!(out.port.messages[1], vec![0x80, 72, 0]);
    }

    #[test]
    fn test_cv_lane_maps_to_configured_controller() {
        let mut out = adapter();
        out.send(OutputEvent::Cv { lane: 1, value: 99 });
        assert_eq!(out.port.messages[0], vec![0xB0, 2, 99]);
    }

    #[test]
    fn test_cv_lane_out_of_range_is_ignored() {
        let mut out = adapter();
        out.send(OutputEvent::Cv { lane: 9, value: 1 });
        assert!(out.port.messages.is_empty());
    }

    #[test]
    fn test_channel_applied_to_status_byte() {
        let assign = OutputAssignments {
            channel: 2,
            ..Default::default()
        };
        let mut out = MidiOutputAdapter::new(MockMidiOutput::new(), assign);
        out.send(OutputEvent::GateOn);
        assert_eq!(out.port.messages[0][0], 0x92);
    }
}

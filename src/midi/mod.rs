// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI I/O abstraction layer.
//!
//! This module provides a trait-based abstraction over MIDI output, message
//! parsing for the input side, and the vendor sysex framing for Launch
//! Control XL LEDs. The midir-backed port implementations live in
//! [`ports`]; tests use mock outputs and never touch hardware.

pub mod ports;

use anyhow::Result;
use tracing::warn;

use crate::control::{Color, LedSink};

pub use ports::{list_inputs, list_outputs, print_inputs, print_outputs, MidiInputPort, MidiOutputPort};

/// Trait for MIDI output implementations.
///
/// Abstracts over backends so the output and LED adapters can be tested
/// against recording mocks.
pub trait MidiOutput: Send {
    /// Send a raw MIDI message (e.g. `[0x90, 60, 127]` for Note On).
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const SYSEX_END: u8 = 0xF7;
}

/// Parsed MIDI input message. Only the message kinds the surface produces
/// are distinguished; everything else is carried as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127)
    NoteOff { channel: u8, note: u8 },
    /// Unparsed message
    Unknown(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let msg_type = data[0] & 0xF0;
        let channel = data[0] & 0x0F;

        match msg_type {
            messages::CONTROL_CHANGE if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            messages::NOTE_ON if data.len() >= 3 => {
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data[1] & 0x7F,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data[1] & 0x7F,
                        velocity,
                    })
                }
            }
            messages::NOTE_OFF if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel,
                note: data[1] & 0x7F,
            }),
            _ => Some(MidiMessage::Unknown(data.to_vec())),
        }
    }
}

/// Sysex header selecting a Launch Control XL template LED write
const LED_SYSEX_HEADER: [u8; 7] = [
    messages::SYSEX_START,
    0x00,
    0x20,
    0x29, // Focusrite/Novation manufacturer ID
    0x02,
    0x11, // Launch Control XL device ID
    0x78, // set-LED command
];

/// Build the sysex message setting one LED on the given template.
pub fn led_message(template: u8, led: u8, color: Color) -> [u8; 11] {
    let mut msg = [0u8; 11];
    msg[..7].copy_from_slice(&LED_SYSEX_HEADER);
    msg[7] = template & 0x7F;
    msg[8] = led & 0x7F;
    msg[9] = color.byte();
    msg[10] = messages::SYSEX_END;
    msg
}

/// LED feedback adapter writing vendor sysex to a MIDI output.
///
/// Failed writes are logged and dropped; the port reconnects on a later
/// send and the next full refresh repaints the surface.
pub struct SysexLedSink<M> {
    port: M,
    template: u8,
}

impl<M: MidiOutput> SysexLedSink<M> {
    pub fn new(port: M, template: u8) -> Self {
        Self { port, template }
    }
}

impl<M: MidiOutput> LedSink for SysexLedSink<M> {
    fn set_led(&mut self, led: u8, color: Color) {
        let msg = led_message(self.template, led, color);
        if let Err(e) = self.port.send(&msg) {
            warn!(led, "dropping LED update after send failure: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockMidiOutput {
        messages: Vec<Vec<u8>>,
    }

    impl MidiOutput for MockMidiOutput {
        fn send(&mut self, message: &[u8]) -> Result<()> {
            self.messages.push(message.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_parse_control_change() {
        let msg = MidiMessage::parse(&[0xB0, 24, 127]);
        assert_eq!(
            msg,
            Some(MidiMessage::ControlChange {
                channel: 0,
                controller: 24,
                value: 127
            })
        );
    }

    #[test]
    fn test_parse_control_change_channel() {
        let msg = MidiMessage::parse(&[0xB8, 0, 64]);
        assert_eq!(
            msg,
            Some(MidiMessage::ControlChange {
                channel: 8,
                controller: 0,
                value: 64
            })
        );
    }

    #[test]
    fn test_parse_note_on_velocity_zero_is_note_off() {
        let msg = MidiMessage::parse(&[0x90, 60, 0]);
        assert_eq!(msg, Some(MidiMessage::NoteOff { channel: 0, note: 60 }));
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(
            MidiMessage::parse(&[0xF8]),
            Some(MidiMessage::Unknown(vec![0xF8]))
        );
    }

    #[test]
    fn test_led_message_framing() {
        let msg = led_message(0, 5, Color::GREEN_3);
        assert_eq!(
            msg,
            [0xF0, 0x00, 0x20, 0x29, 0x02, 0x11, 0x78, 0, 5, 48, 0xF7]
        );
    }

    #[test]
    fn test_sysex_led_sink_writes_frames() {
        let mut sink = SysexLedSink::new(
            MockMidiOutput {
                messages: Vec::new(),
            },
            0,
        );
        sink.set_led(3, Color::RED_3);
        assert_eq!(sink.port.messages.len(), 1);
        assert_eq!(sink.port.messages[0][8], 3);
        assert_eq!(sink.port.messages[0][9], 3);
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control surface: input routing and LED feedback.
//!
//! This module provides:
//! - The two-component LED color model of the Launch Control XL
//! - Routing of raw control-change input to logical [`ControlEvent`]s
//! - Recomputation of every control's LED color from sequencer state

pub mod layout;

pub use layout::{ControlSpec, SurfaceLayout};

use crate::sequencer::StepSequencer;

/// Control values at or above this count as a button press; below it, a
/// release. Fixed convention of the controller protocol.
pub const PRESS_THRESHOLD: u8 = 64;

/// An LED color as red and green components, each 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
}

impl Color {
    pub const OFF: Color = Color::new(0, 0);
    pub const RED_1: Color = Color::new(1, 0);
    pub const RED_2: Color = Color::new(2, 0);
    pub const RED_3: Color = Color::new(3, 0);
    pub const GREEN_1: Color = Color::new(0, 1);
    pub const GREEN_2: Color = Color::new(0, 2);
    pub const GREEN_3: Color = Color::new(0, 3);
    pub const YELLOW_1: Color = Color::new(1, 1);
    pub const YELLOW_2: Color = Color::new(2, 2);
    pub const YELLOW_3: Color = Color::new(3, 3);

    pub const fn new(red: u8, green: u8) -> Self {
        Self { red, green }
    }

    /// Pack into the wire byte: low nibble red, high nibble green.
    pub fn byte(self) -> u8 {
        (self.red & 0x0F) | (self.green << 4)
    }

    /// Unpack from the wire byte.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            red: byte & 0x0F,
            green: byte >> 4,
        }
    }
}

/// A logical input event after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A step-mode button was pressed
    StepModePressed { step: usize },
    /// A gate-mode button was pressed
    GateModePressed { step: usize },
    /// A pitch knob moved
    NoteValue { step: usize, value: u8 },
    /// An auxiliary knob or fader moved
    AuxValue { step: usize, lane: usize, value: u8 },
    /// The run/stop button was pressed
    TransportPressed,
    /// The tap-tempo button was pressed
    TapPressed,
    /// The reset button was pressed
    ResetPressed,
}

/// Consumer of LED color updates. Implementations may drop writes on
/// transport failure; feedback is best-effort.
pub trait LedSink {
    fn set_led(&mut self, led: u8, color: Color);
}

/// The logical control surface: routes raw input to events and computes
/// the full LED picture from engine state.
#[derive(Debug, Clone)]
pub struct Surface {
    layout: SurfaceLayout,
}

impl Surface {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Route one control-change message to a logical event.
    ///
    /// Knob and fader rows report every value; button rows only produce an
    /// event on the press half of the threshold. Unmapped controls and
    /// filtered channels return `None`.
    pub fn route(&self, channel: u8, cc: u8, value: u8) -> Option<ControlEvent> {
        if let Some(expected) = self.layout.channel {
            if channel != expected {
                return None;
            }
        }

        if let Some(step) = position(&self.layout.send_a, cc) {
            return Some(ControlEvent::NoteValue { step, value });
        }
        for (lane, controls) in [
            &self.layout.send_b,
            &self.layout.pan_device,
            &self.layout.faders,
        ]
        .into_iter()
        .enumerate()
        {
            if let Some(step) = position(controls, cc) {
                return Some(ControlEvent::AuxValue { step, lane, value });
            }
        }

        let pressed = value >= PRESS_THRESHOLD;
        if let Some(step) = position(&self.layout.track_focus, cc) {
            return pressed.then_some(ControlEvent::GateModePressed { step });
        }
        if let Some(step) = position(&self.layout.track_control, cc) {
            return pressed.then_some(ControlEvent::StepModePressed { step });
        }
        if cc == self.layout.transport.cc {
            return pressed.then_some(ControlEvent::TransportPressed);
        }
        if cc == self.layout.tap.cc {
            return pressed.then_some(ControlEvent::TapPressed);
        }
        if cc == self.layout.reset.cc {
            return pressed.then_some(ControlEvent::ResetPressed);
        }
        None
    }

    /// Compute the color of every LED on the surface.
    ///
    /// `blink_on` is the per-beat tempo indicator phase: bright from the
    /// tick until the blink timer dims it partway through the interval.
    pub fn led_states(
        &self,
        engine: &StepSequencer,
        running: bool,
        blink_on: bool,
    ) -> Vec<(u8, Color)> {
        let mut states = Vec::new();
        let current = engine.current_step();

        for step in 0..engine.total_steps().min(self.layout.steps()) {
            let is_current = step == current;

            if let Some(led) = self.layout.track_control[step].led {
                let mode = engine.step_mode(step);
                states.push((led, mode_color(mode.current_step_color(), mode.other_step_color(), is_current)));
            }
            if let Some(led) = self.layout.track_focus[step].led {
                let mode = engine.gate_mode(step);
                states.push((led, mode_color(mode.current_step_color(), mode.other_step_color(), is_current)));
            }
            if let Some(led) = self.layout.send_a[step].led {
                states.push((led, value_color(engine.has_note_value(step), is_current)));
            }
            for (lane, controls) in [
                &self.layout.send_b,
                &self.layout.pan_device,
                &self.layout.faders,
            ]
            .into_iter()
            .enumerate()
            {
                if let Some(led) = controls[step].led {
                    states.push((led, value_color(engine.has_aux_value(step, lane), is_current)));
                }
            }
        }

        if let Some(led) = self.layout.transport.led {
            let color = if !running {
                Color::RED_1
            } else if blink_on {
                Color::GREEN_3
            } else {
                Color::GREEN_1
            };
            states.push((led, color));
        }
        if let Some(led) = self.layout.tap.led {
            states.push((led, Color::YELLOW_1));
        }
        if let Some(led) = self.layout.reset.led {
            states.push((led, Color::RED_1));
        }

        states
    }
}

fn position(controls: &[ControlSpec], cc: u8) -> Option<usize> {
    controls.iter().position(|c| c.cc == cc)
}

fn mode_color(current: Color, other: Color, is_current: bool) -> Color {
    if is_current {
        current
    } else {
        other
    }
}

/// Value knobs glow red until their control first reports, then green;
/// the cursor brightens whichever step it sits on.
fn value_color(has_value: bool, is_current: bool) -> Color {
    match (has_value, is_current) {
        (true, true) => Color::GREEN_3,
        (true, false) => Color::GREEN_1,
        (false, true) => Color::RED_3,
        (false, false) => Color::RED_1,
    }
}

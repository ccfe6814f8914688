// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core.
//!
//! This module provides the step sequencing engine:
//! - Step and gate mode tables with LED and duty-cycle metadata
//! - The pulse primitive for scheduled on/off signal pairs
//! - The engine itself: cursor advance, mode resolution, output emission

pub mod engine;
pub mod modes;
pub mod pulse;

pub use engine::{StepSequencer, AUX_VALUES};
pub use modes::{GateMode, StepMode};
pub use pulse::{Pulse, PULSE_WIDTH};

/// Payload for clock timers scheduled by the engine.
///
/// The host loop receives these back from the clock and dispatches them
/// through [`StepSequencer::handle_timer`]; `BeatBlinkOff` is a
/// presentation-only timer consumed by the app instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Close the trigger pulse
    TriggerOff,
    /// Close the gate
    GateOff,
    /// Release the given pitch
    NoteOff(u8),
    /// Close the end-of-sequence pulse
    EndOfSequenceOff,
    /// Dim the tempo-indicator LED for the rest of the interval
    BeatBlinkOff,
}

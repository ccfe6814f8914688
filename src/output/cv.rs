// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! CV.OCD voltage calibration helpers.
//!
//! The CV.OCD maps MIDI note numbers linearly onto its 0-8V pitch output;
//! these helpers convert between volts and the note values the box expects,
//! for calibration sweeps and fixed-voltage presets.

/// MIDI note producing 0V on a factory-calibrated CV.OCD
pub const CV_OCD_MIDI_0V: u8 = 24;

/// MIDI note producing 8V on a factory-calibrated CV.OCD
pub const CV_OCD_MIDI_8V: u8 = 120;

/// Linearly remap `value` from the range `[min1, max1]` to `[min2, max2]`.
pub fn remap(value: f64, min1: f64, max1: f64, min2: f64, max2: f64) -> f64 {
    min2 + ((max2 - min2) / (max1 - min1)) * (value - min1)
}

/// Remap and clamp into the destination range.
pub fn remap_clamped(value: f64, min1: f64, max1: f64, min2: f64, max2: f64) -> f64 {
    remap(value, min1, max1, min2, max2).clamp(min2, max2)
}

/// MIDI note value that produces the given voltage on the pitch output.
/// Out-of-range voltages clamp to the calibrated endpoints.
pub fn volts_to_midi(volts: f64) -> u8 {
    remap_clamped(
        volts,
        0.0,
        8.0,
        CV_OCD_MIDI_0V as f64,
        CV_OCD_MIDI_8V as f64,
    ) as u8
}

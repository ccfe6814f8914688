// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Physical layout of the Launch Control XL surface.
//!
//! Maps every control the sequencer uses to its CC number and LED index.
//! The defaults match the factory user template; a config file can override
//! any row, which is also how a 16-step surface pairing would be described.

use serde::{Deserialize, Serialize};

/// One physical control: CC number plus LED index. The faders have no LED.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlSpec {
    pub cc: u8,
    #[serde(default)]
    pub led: Option<u8>,
}

impl ControlSpec {
    pub fn new(cc: u8, led: Option<u8>) -> Self {
        Self { cc, led }
    }
}

/// Role assignment for the whole surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceLayout {
    /// Restrict input to one MIDI channel; `None` accepts any channel
    #[serde(default)]
    pub channel: Option<u8>,
    /// Top knob row, one per step: pitch value (SEND A)
    pub send_a: Vec<ControlSpec>,
    /// Second knob row, one per step: CV lane 0 (SEND B)
    pub send_b: Vec<ControlSpec>,
    /// Third knob row, one per step: CV lane 1 (PAN / DEVICE)
    pub pan_device: Vec<ControlSpec>,
    /// Faders, one per step: CV lane 2
    pub faders: Vec<ControlSpec>,
    /// Upper button row, one per step: gate mode (TRACK FOCUS)
    pub track_focus: Vec<ControlSpec>,
    /// Lower button row, one per step: step mode (TRACK CONTROL)
    pub track_control: Vec<ControlSpec>,
    /// Run/stop toggle (DEVICE side button)
    pub transport: ControlSpec,
    /// Tap tempo (MUTE side button)
    pub tap: ControlSpec,
    /// Sequence reset (SOLO side button)
    pub reset: ControlSpec,
}

fn row(first_cc: u8, first_led: Option<u8>) -> Vec<ControlSpec> {
    (0..8)
        .map(|i| ControlSpec::new(first_cc + i, first_led.map(|led| led + i)))
        .collect()
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            channel: None,
            send_a: row(0, Some(0)),
            send_b: row(8, Some(8)),
            pan_device: row(16, Some(16)),
            faders: row(48, None),
            track_focus: row(24, Some(24)),
            track_control: row(32, Some(32)),
            transport: ControlSpec::new(40, Some(40)),
            tap: ControlSpec::new(41, Some(41)),
            reset: ControlSpec::new(42, Some(42)),
        }
    }
}

impl SurfaceLayout {
    /// Number of steps this layout can drive (the shortest per-step row)
    pub fn steps(&self) -> usize {
        [
            self.send_a.len(),
            self.send_b.len(),
            self.pan_device.len(),
            self.faders.len(),
            self.track_focus.len(),
            self.track_control.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
    }

    /// Per-step rows with their names, for validation messages
    pub fn step_rows(&self) -> [(&'static str, &[ControlSpec]); 6] {
        [
            ("send_a", &self.send_a),
            ("send_b", &self.send_b),
            ("pan_device", &self.pan_device),
            ("faders", &self.faders),
            ("track_focus", &self.track_focus),
            ("track_control", &self.track_control),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_has_eight_steps() {
        let layout = SurfaceLayout::default();
        assert_eq!(layout.steps(), 8);
        for (_, row) in layout.step_rows() {
            assert_eq!(row.len(), 8);
        }
    }

    #[test]
    fn test_default_cc_assignments() {
        let layout = SurfaceLayout::default();
        assert_eq!(layout.send_a[0].cc, 0);
        assert_eq!(layout.send_b[7].cc, 15);
        assert_eq!(layout.pan_device[0].cc, 16);
        assert_eq!(layout.faders[0].cc, 48);
        assert_eq!(layout.track_focus[0].cc, 24);
        assert_eq!(layout.track_control[7].cc, 39);
        assert_eq!(layout.transport.cc, 40);
    }

    #[test]
    fn test_faders_have_no_leds() {
        let layout = SurfaceLayout::default();
        assert!(layout.faders.iter().all(|c| c.led.is_none()));
        assert!(layout.send_a.iter().all(|c| c.led.is_some()));
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for XLSTEP.
//!
//! The whole rig is described by one YAML file: sequencer parameters, MIDI
//! port selection, downstream note/CC assignments and the surface layout.
//! Every field has a default matching the reference hardware, so an empty
//! file is a valid configuration. Validation runs once at load; a sequencer
//! is never constructed from an invalid document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::SurfaceLayout;
use crate::output::OutputAssignments;
use crate::timing::{MAX_BPM, MIN_BPM};

/// Configuration faults, all fatal at load time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("total_steps must be at least 1")]
    NoSteps,
    #[error("tempo must be a finite value in {MIN_BPM}..={MAX_BPM} BPM (got {0})")]
    TempoOutOfRange(f64),
    #[error("unset_value must be a MIDI data byte 0-127 (got {0})")]
    UnsetValueOutOfRange(u8),
    #[error("MIDI channel must be 0-15 (got {0})")]
    ChannelOutOfRange(u8),
    #[error("layout row `{row}` has {got} controls but total_steps is {expected}")]
    LayoutRowMismatch {
        row: &'static str,
        got: usize,
        expected: usize,
    },
}

/// Root configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RigConfig {
    /// Sequencer parameters
    #[serde(default)]
    pub sequencer: SequencerConfig,
    /// MIDI port selection
    #[serde(default)]
    pub ports: PortConfig,
    /// Downstream note/CC assignments
    #[serde(default)]
    pub output: OutputAssignments,
    /// Surface layout override
    #[serde(default)]
    pub layout: SurfaceLayout,
}

impl RigConfig {
    /// Load and validate a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check every construction-time precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let steps = self.sequencer.total_steps;
        if steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        let tempo = self.sequencer.tempo;
        if !tempo.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&tempo) {
            return Err(ConfigError::TempoOutOfRange(tempo));
        }
        if self.sequencer.unset_value > 127 {
            return Err(ConfigError::UnsetValueOutOfRange(self.sequencer.unset_value));
        }
        if self.output.channel > 15 {
            return Err(ConfigError::ChannelOutOfRange(self.output.channel));
        }
        if let Some(channel) = self.layout.channel {
            if channel > 15 {
                return Err(ConfigError::ChannelOutOfRange(channel));
            }
        }
        for (row, controls) in self.layout.step_rows() {
            if controls.len() != steps {
                return Err(ConfigError::LayoutRowMismatch {
                    row,
                    got: controls.len(),
                    expected: steps,
                });
            }
        }
        Ok(())
    }
}

/// Sequencer parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequencerConfig {
    /// Number of step slots (must match the layout rows)
    #[serde(default = "default_total_steps")]
    pub total_steps: usize,
    /// Startup tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Value substituted for knobs that have never reported. Earlier rigs
    /// used the mid-range 64; current hardware profiles use 0.
    #[serde(default)]
    pub unset_value: u8,
}

fn default_total_steps() -> usize {
    8
}
fn default_tempo() -> f64 {
    240.0
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            total_steps: default_total_steps(),
            tempo: default_tempo(),
            unset_value: 0,
        }
    }
}

/// MIDI port selection, by name substring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortConfig {
    /// Input port carrying the surface's control changes
    #[serde(default = "default_surface_port")]
    pub input: String,
    /// Output port for LED feedback (normally the same device)
    #[serde(default = "default_surface_port")]
    pub leds: String,
    /// Output port toward the CV converter; `None` takes the first
    /// available port
    #[serde(default)]
    pub output: Option<String>,
    /// Launch Control XL template addressed by LED writes
    #[serde(default)]
    pub template: u8,
}

fn default_surface_port() -> String {
    "Launch Control XL".to_string()
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            input: default_surface_port(),
            leds: default_surface_port(),
            output: None,
            template: 0,
        }
    }
}

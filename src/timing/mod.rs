// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the cooperative musical clock that drives the
//! sequencer, plus tap-tempo estimation.

pub mod clock;

pub use clock::{Clock, ClockEvent, TapTempo, MAX_BPM, MIN_BPM};

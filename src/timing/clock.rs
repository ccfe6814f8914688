// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cooperative musical clock.
//!
//! The clock is polled from a single host loop and never blocks. Each call
//! to [`Clock::tick`] compares wall-clock time against the current interval
//! anchor and returns the events that became due: one-shot timers scheduled
//! at an offset into the interval, per-interval fraction timers, and the
//! interval boundary itself. Timer payloads are plain `Copy` values that the
//! host dispatches through its own handler, so the clock performs no I/O and
//! owns no callbacks.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Slowest supported tempo
pub const MIN_BPM: f64 = 20.0;

/// Fastest supported tempo. Tap estimates beyond this are treated as
/// measurement noise and discarded by the caller.
pub const MAX_BPM: f64 = 999.0;

/// An event returned from [`Clock::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent<T> {
    /// An interval boundary was crossed
    Tick,
    /// A scheduled timer became due
    Timer(T),
}

/// A one-shot timer, measured from the interval anchor
#[derive(Debug, Clone, Copy)]
struct OneShot<T> {
    offset: Duration,
    payload: T,
}

/// A persistent per-interval timer, re-armed at every boundary
#[derive(Debug, Clone, Copy)]
struct FractionTimer<T> {
    fraction: f64,
    payload: T,
}

/// Wall-clock driven cooperative scheduler.
///
/// All state is owned by the polling thread; `tick` must be called at a
/// cadence well below the interval (a few milliseconds) for timers to fire
/// close to their nominal offsets.
#[derive(Debug)]
pub struct Clock<T> {
    bpm: f64,
    interval: Duration,
    anchor: Instant,
    running: bool,
    one_shots: Vec<OneShot<T>>,
    templates: Vec<FractionTimer<T>>,
    pending: Vec<FractionTimer<T>>,
}

impl<T: Copy> Clock<T> {
    /// Create a stopped clock at the given tempo (clamped to the supported
    /// band).
    pub fn new(bpm: f64, now: Instant) -> Self {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        Self {
            bpm,
            interval: interval_for(bpm),
            anchor: now,
            running: false,
            one_shots: Vec::new(),
            templates: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Current tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one interval (one sequencer step) at the current tempo
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the clock is advancing
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Update the tempo. Takes effect from the next computed interval;
    /// already-scheduled one-shot offsets are left as computed against the
    /// old interval.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.interval = interval_for(self.bpm);
    }

    /// Start or stop the clock. Starting re-anchors time at `now` so a
    /// stale, overdue boundary does not fire on the first poll after a
    /// pause.
    pub fn set_running(&mut self, running: bool, now: Instant) {
        if running && !self.running {
            self.restart(now);
        }
        self.running = running;
    }

    /// Toggle run state; returns the new state.
    pub fn toggle(&mut self, now: Instant) -> bool {
        self.set_running(!self.running, now);
        self.running
    }

    /// Re-anchor the interval at `now` and re-arm the per-interval timers.
    pub fn restart(&mut self, now: Instant) {
        self.anchor = now;
        self.pending = self.templates.clone();
    }

    /// Register a one-shot timer at `offset` into the current interval.
    /// Due timers are consumed by the next `tick` call.
    pub fn schedule_once(&mut self, offset: Duration, payload: T) {
        self.one_shots.push(OneShot { offset, payload });
    }

    /// Register a persistent timer firing once per interval, when `fraction`
    /// of the interval has elapsed. Armed from the next boundary (or
    /// `restart`).
    pub fn schedule_per_interval(&mut self, fraction: f64, payload: T) {
        self.templates.push(FractionTimer { fraction, payload });
    }

    /// Poll the clock. Returns due events in firing order: one-shots, then
    /// per-interval timers, then the boundary tick. The anchor advances by
    /// exactly one interval per boundary so timing error never accumulates.
    pub fn tick(&mut self, now: Instant) -> Vec<ClockEvent<T>> {
        if !self.running {
            return Vec::new();
        }

        let mut fired = Vec::new();
        let diff = now.saturating_duration_since(self.anchor);

        let mut i = 0;
        while i < self.one_shots.len() {
            if self.one_shots[i].offset <= diff {
                fired.push(ClockEvent::Timer(self.one_shots.remove(i).payload));
            } else {
                i += 1;
            }
        }

        let interval = self.interval;
        let mut i = 0;
        while i < self.pending.len() {
            if interval.mul_f64(self.pending[i].fraction) <= diff {
                fired.push(ClockEvent::Timer(self.pending.remove(i).payload));
            } else {
                i += 1;
            }
        }

        if diff >= interval {
            self.anchor += interval;
            fired.push(ClockEvent::Tick);

            // Re-arm fraction timers for the new interval, skipping any
            // whose firing point already lies in the past.
            let elapsed = now.saturating_duration_since(self.anchor);
            self.pending = self
                .templates
                .iter()
                .filter(|t| interval.mul_f64(t.fraction) > elapsed)
                .copied()
                .collect();
        }

        fired
    }
}

fn interval_for(bpm: f64) -> Duration {
    Duration::from_secs_f64(60.0 / bpm)
}

/// Number of taps required before an estimate is produced
pub const TAP_WINDOW: usize = 4;

/// Gap after which a pending tap window is considered stale
pub const TAP_STALE_AFTER: Duration = Duration::from_secs(3);

/// Tap tempo estimator.
///
/// Keeps a sliding window of the most recent taps and derives a tempo from
/// the average gap across the window. The raw estimate is returned as-is;
/// callers reject non-finite or out-of-band values before applying them
/// (two taps inside the timer resolution produce an infinite BPM).
#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(TAP_WINDOW + 1),
        }
    }

    /// Record a tap and return the estimated BPM once the window is full.
    ///
    /// A gap longer than [`TAP_STALE_AFTER`] discards the previous window,
    /// so a fresh run of taps is needed after a pause. Once full, the window
    /// slides: each further tap evicts the oldest and refines the estimate.
    pub fn tap(&mut self, now: Instant) -> Option<f64> {
        if let Some(&last) = self.taps.back() {
            if now.saturating_duration_since(last) > TAP_STALE_AFTER {
                self.taps.clear();
            }
        }

        self.taps.push_back(now);
        if self.taps.len() > TAP_WINDOW {
            self.taps.pop_front();
        }
        if self.taps.len() < TAP_WINDOW {
            return None;
        }

        let oldest = *self.taps.front()?;
        let newest = *self.taps.back()?;
        let span = newest.saturating_duration_since(oldest);
        let interval = span.as_secs_f64() / (TAP_WINDOW - 1) as f64;
        Some(60.0 / interval)
    }

    /// Discard any pending taps
    pub fn reset(&mut self) {
        self.taps.clear();
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}

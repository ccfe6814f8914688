// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Composition root and polling loop.
//!
//! [`App`] owns the clock, the tap estimator, the engine and the surface,
//! and dispatches every event through one handler so ordering stays
//! deterministic. [`run`] wires it to real MIDI ports and polls at a
//! millisecond cadence; everything above the port layer is exercised in
//! tests with recording sinks.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::RigConfig;
use crate::control::{Color, ControlEvent, LedSink, Surface};
use crate::midi::{MidiInputPort, MidiMessage, MidiOutputPort, SysexLedSink};
use crate::output::{MidiOutputAdapter, OutputSink};
use crate::sequencer::{StepSequencer, Timer};
use crate::timing::{Clock, ClockEvent, TapTempo, MAX_BPM, MIN_BPM};

/// Fraction of the interval after which the tempo-indicator LED dims
pub const BEAT_BLINK_FRACTION: f64 = 0.2;

/// Cadence of the host polling loop
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The assembled sequencer application, free of I/O.
pub struct App {
    clock: Clock<Timer>,
    tap: TapTempo,
    engine: StepSequencer,
    surface: Surface,
    blink_on: bool,
    led_cache: HashMap<u8, Color>,
}

impl App {
    /// Build from a validated configuration.
    pub fn new(config: &RigConfig, now: Instant) -> Result<Self> {
        config.validate()?;

        let mut clock = Clock::new(config.sequencer.tempo, now);
        clock.schedule_per_interval(BEAT_BLINK_FRACTION, Timer::BeatBlinkOff);

        Ok(Self {
            clock,
            tap: TapTempo::new(),
            engine: StepSequencer::new(config.sequencer.total_steps, config.sequencer.unset_value),
            surface: Surface::new(config.layout.clone()),
            blink_on: false,
            led_cache: HashMap::new(),
        })
    }

    pub fn engine(&self) -> &StepSequencer {
        &self.engine
    }

    pub fn clock(&self) -> &Clock<Timer> {
        &self.clock
    }

    /// Start the clock and paint the initial LED picture.
    pub fn start(&mut self, now: Instant, leds: &mut dyn LedSink) {
        self.clock.set_running(true, now);
        info!(bpm = self.clock.bpm(), steps = self.engine.total_steps(), "sequencer running");
        self.refresh_leds(leds);
    }

    /// One pass of the cooperative scheduler. Advances the sequence on
    /// interval boundaries and dispatches due timers.
    pub fn poll(&mut self, now: Instant, out: &mut dyn OutputSink, leds: &mut dyn LedSink) {
        let mut dirty = false;
        for event in self.clock.tick(now) {
            match event {
                ClockEvent::Tick => {
                    self.blink_on = true;
                    self.engine.step(None, &mut self.clock, out);
                    dirty = true;
                }
                ClockEvent::Timer(Timer::BeatBlinkOff) => {
                    self.blink_on = false;
                    dirty = true;
                }
                ClockEvent::Timer(timer) => self.engine.handle_timer(timer, out),
            }
        }
        if dirty {
            self.refresh_leds(leds);
        }
    }

    /// Route one raw control change into the surface and act on it.
    pub fn handle_control(
        &mut self,
        channel: u8,
        cc: u8,
        value: u8,
        now: Instant,
        out: &mut dyn OutputSink,
        leds: &mut dyn LedSink,
    ) {
        if let Some(event) = self.surface.route(channel, cc, value) {
            self.handle_event(event, now, out, leds);
        }
    }

    /// Single handler for every logical control event.
    pub fn handle_event(
        &mut self,
        event: ControlEvent,
        now: Instant,
        out: &mut dyn OutputSink,
        leds: &mut dyn LedSink,
    ) {
        match event {
            ControlEvent::StepModePressed { step } => {
                self.engine.cycle_step_mode(step);
            }
            ControlEvent::GateModePressed { step } => {
                if self.engine.cycle_gate_mode(step).is_none() {
                    debug!(step, "gate mode change refused on unplayed step");
                }
            }
            ControlEvent::NoteValue { step, value } => self.engine.set_note_value(step, value),
            ControlEvent::AuxValue { step, lane, value } => {
                self.engine.set_aux_value(step, lane, value)
            }
            ControlEvent::TransportPressed => {
                let running = self.clock.toggle(now);
                if !running {
                    self.engine.silence(out);
                }
                info!(running, "transport toggled");
            }
            ControlEvent::TapPressed => {
                if let Some(bpm) = self.tap.tap(now) {
                    if bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(&bpm) {
                        self.clock.set_tempo(bpm);
                        info!("tap tempo: {:.1} BPM", bpm);
                    } else {
                        warn!("discarding implausible tap tempo estimate");
                    }
                }
            }
            ControlEvent::ResetPressed => {
                self.engine.reset(now, &mut self.clock, out);
                info!("sequence reset");
            }
        }
        self.refresh_leds(leds);
    }

    /// Push only the LED changes since the last refresh.
    fn refresh_leds(&mut self, leds: &mut dyn LedSink) {
        let states = self
            .surface
            .led_states(&self.engine, self.clock.is_running(), self.blink_on);
        for (led, color) in states {
            if self.led_cache.get(&led) != Some(&color) {
                leds.set_led(led, color);
                self.led_cache.insert(led, color);
            }
        }
    }
}

/// Connect to the hardware and run the polling loop forever.
pub fn run(config: RigConfig) -> Result<()> {
    let input = MidiInputPort::connect(&config.ports.input)?;
    let mut leds = SysexLedSink::new(
        MidiOutputPort::connect(Some(config.ports.leds.as_str()))?,
        config.ports.template,
    );
    let mut out = MidiOutputAdapter::new(
        MidiOutputPort::connect(config.ports.output.as_deref())?,
        config.output.clone(),
    );

    let mut app = App::new(&config, Instant::now())?;
    app.start(Instant::now(), &mut leds);

    loop {
        for msg in input.recv_all() {
            if let MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } = msg
            {
                app.handle_control(channel, controller, value, Instant::now(), &mut out, &mut leds);
            }
        }
        app.poll(Instant::now(), &mut out, &mut leds);
        thread::sleep(POLL_INTERVAL);
    }
}

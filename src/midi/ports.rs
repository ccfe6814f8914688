// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midir-backed MIDI port connections.
//!
//! Ports are selected by a case-sensitive name substring ("Launch Control
//! XL" in the reference rig). Input messages are parsed on the midir thread
//! and handed to the polling loop over a channel; output connections are
//! re-established on the next send after a failure, so an unplugged cable
//! costs dropped messages, never a crash.

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput as MidirInput, MidiInputConnection, MidiOutput as MidirOutput, MidiOutputConnection};
use tracing::{info, warn};

use super::{MidiMessage, MidiOutput};

const CLIENT_NAME: &str = "xlstep";

/// MIDI input connected to the control surface.
pub struct MidiInputPort {
    _connection: MidiInputConnection<()>,
    receiver: Receiver<MidiMessage>,
}

impl MidiInputPort {
    /// Connect to the first input port whose name contains `filter`.
    pub fn connect(filter: &str) -> Result<Self> {
        let mut midi_in =
            MidirInput::new(CLIENT_NAME).map_err(|e| anyhow!("failed to create MIDI input client: {}", e))?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map(|name| name.contains(filter))
                    .unwrap_or(false)
            })
            .ok_or_else(|| anyhow!("no MIDI input port matching \"{}\"", filter))?;

        let name = midi_in.port_name(port).unwrap_or_else(|_| "unknown".to_string());
        info!("connecting MIDI input: {}", name);

        let (tx, rx): (Sender<MidiMessage>, Receiver<MidiMessage>) = mpsc::channel();
        let connection = midi_in
            .connect(
                port,
                "xlstep-input",
                move |_timestamp, bytes, _| {
                    if let Some(msg) = MidiMessage::parse(bytes) {
                        let _ = tx.send(msg);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("failed to connect MIDI input: {}", e))?;

        Ok(Self {
            _connection: connection,
            receiver: rx,
        })
    }

    /// Try to receive the next message (non-blocking)
    pub fn try_recv(&self) -> Option<MidiMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn recv_all(&self) -> Vec<MidiMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = self.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

/// MIDI output with reconnect-on-next-send recovery.
pub struct MidiOutputPort {
    filter: Option<String>,
    connection: Option<MidiOutputConnection>,
}

impl MidiOutputPort {
    /// Connect to the first output port whose name contains `filter`
    /// (`None` takes the first available port). Fails if no port matches
    /// at startup; later failures are recovered send-by-send.
    pub fn connect(filter: Option<&str>) -> Result<Self> {
        let connection = open_output(filter)?;
        Ok(Self {
            filter: filter.map(str::to_string),
            connection: Some(connection),
        })
    }
}

impl MidiOutput for MidiOutputPort {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        if self.connection.is_none() {
            match open_output(self.filter.as_deref()) {
                Ok(conn) => self.connection = Some(conn),
                Err(e) => return Err(e.context("reconnect failed")),
            }
        }

        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| anyhow!("MIDI output not connected"))?;
        if let Err(e) = conn.send(message) {
            // Drop the connection; the next send retries from scratch.
            warn!("MIDI send failed, will reconnect: {}", e);
            self.connection = None;
            return Err(anyhow!("MIDI send failed: {}", e));
        }
        Ok(())
    }
}

fn open_output(filter: Option<&str>) -> Result<MidiOutputConnection> {
    let midi_out =
        MidirOutput::new(CLIENT_NAME).map_err(|e| anyhow!("failed to create MIDI output client: {}", e))?;

    let ports = midi_out.ports();
    let port = ports
        .iter()
        .find(|p| match filter {
            Some(f) => midi_out
                .port_name(p)
                .map(|name| name.contains(f))
                .unwrap_or(false),
            None => true,
        })
        .ok_or_else(|| match filter {
            Some(f) => anyhow!("no MIDI output port matching \"{}\"", f),
            None => anyhow!("no MIDI output ports available"),
        })?;

    let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".to_string());
    info!("connecting MIDI output: {}", name);

    midi_out
        .connect(port, "xlstep-output")
        .map_err(|e| anyhow!("failed to connect MIDI output: {}", e))
}

/// List all available MIDI input port names
pub fn list_inputs() -> Result<Vec<String>> {
    let midi_in =
        MidirInput::new(CLIENT_NAME).map_err(|e| anyhow!("failed to create MIDI input client: {}", e))?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect())
}

/// List all available MIDI output port names
pub fn list_outputs() -> Result<Vec<String>> {
    let midi_out =
        MidirOutput::new(CLIENT_NAME).map_err(|e| anyhow!("failed to create MIDI output client: {}", e))?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

/// Print all available MIDI input ports to stdout
pub fn print_inputs() -> Result<()> {
    let inputs = list_inputs()?;
    if inputs.is_empty() {
        println!("No MIDI inputs found.");
    } else {
        println!("Available MIDI inputs:");
        for (i, name) in inputs.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}

/// Print all available MIDI output ports to stdout
pub fn print_outputs() -> Result<()> {
    let outputs = list_outputs()?;
    if outputs.is_empty() {
        println!("No MIDI outputs found.");
    } else {
        println!("Available MIDI outputs:");
        for (i, name) in outputs.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::Level;

use xlstep::config::RigConfig;
use xlstep::midi::{messages, print_inputs, print_outputs, MidiOutput, MidiOutputPort};
use xlstep::output::cv::volts_to_midi;

fn print_usage() {
    println!("XLSTEP - Launch Control XL step sequencer");
    println!();
    println!("Usage: xlstep [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>        Load configuration from FILE (YAML)");
    println!("  --init-config <FILE>   Write the default configuration to FILE and exit");
    println!("  --list-inputs          List available MIDI input ports");
    println!("  --list-outputs         List available MIDI output ports");
    println!("  --test-cv <VOLTS>      Send a calibration note for VOLTS to the CV output");
    println!("  --verbose              Enable debug logging");
    println!("  --help                 Show this help message");
}

/// Send a single calibration note so the CV output can be measured.
fn test_cv(config: &RigConfig, volts: f64) -> Result<()> {
    let note = volts_to_midi(volts);
    println!("Sending note {} for {:.2}V...", note, volts);

    let mut port = MidiOutputPort::connect(config.ports.output.as_deref())?;
    let channel = config.output.channel & 0x0F;
    port.send(&[messages::NOTE_ON | channel, note, config.output.velocity])?;
    thread::sleep(Duration::from_millis(500));
    port.send(&[messages::NOTE_OFF | channel, note, 0])?;

    println!("Done. Measure the pitch CV socket now.");
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<String> = None;
    let mut init_config: Option<String> = None;
    let mut cv_volts: Option<f64> = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--list-inputs" => return print_inputs(),
            "--list-outputs" => return print_outputs(),
            "--verbose" => verbose = true,
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).cloned().ok_or_else(|| {
                    anyhow::anyhow!("--config requires a file path")
                })?);
            }
            "--init-config" => {
                i += 1;
                init_config = Some(args.get(i).cloned().ok_or_else(|| {
                    anyhow::anyhow!("--init-config requires a file path")
                })?);
            }
            "--test-cv" => {
                i += 1;
                let raw = args.get(i).ok_or_else(|| {
                    anyhow::anyhow!("--test-cv requires a voltage")
                })?;
                cv_volts = Some(raw.parse().map_err(|_| {
                    anyhow::anyhow!("Invalid voltage: {}", raw)
                })?);
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Some(path) = init_config {
        RigConfig::default().save(&path)?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    let config = match config_path {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    if let Some(volts) = cv_volts {
        return test_cv(&config, volts);
    }

    xlstep::app::run(config)
}

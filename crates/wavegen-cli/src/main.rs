// SPDX-License-Identifier: AGPL-3.0-only

//! `wavegen` — command-line control for the dual-channel waveform generator.
//!
//! ```text
//! USAGE:
//!   wavegen status                       Decode the status register
//!   wavegen configure [opts] [--wait]    Stage all parameters and apply
//!   wavegen preset <name> [--start]      Apply a built-in 1 kHz preset
//!   wavegen start|stop|trigger|reset     Immediate channel controls
//!   wavegen apply [--wait]               Commit staged parameters
//!   wavegen load-arb <file> [--start N]  Load arbitrary samples from text
//!   wavegen load-sine [--samples N]      Load a generated sine period
//!   wavegen lut [--width W] [--out F]    Emit the quarter-sine ROM as COE
//! ```
//!
//! Every command opens the device afresh. Staged parameters live in the
//! IP's shadow bank, so `configure` without apply followed later by
//! `apply` works across invocations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wavegen_driver::{
    duty_from_percent, hz_to_units, parse_u64, phase_from_degrees, select_backend,
    wait_for_reconfig, waveform, BackendSelection, Channel, ChannelParameters, DriverConfig,
    Preset, RegisterBackend, WaveformMode, Wavegen, MAX_ARB_SAMPLES,
};

type Engine = Wavegen<Box<dyn RegisterBackend>>;

#[derive(Parser)]
#[command(name = "wavegen", about = "Dual-channel waveform generator CLI", version)]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Cmd,
}

/// Overrides for `WAVEGEN_*` environment settings.
#[derive(Args)]
struct Target {
    /// Register access path: auto, kernel, mmap or software.
    #[arg(long, global = true)]
    backend: Option<BackendSelection>,
    /// Kernel driver node (default /dev/wavegen).
    #[arg(long, global = true)]
    device: Option<PathBuf>,
    /// Memory device for direct mapping (default /dev/mem).
    #[arg(long, global = true)]
    mem: Option<PathBuf>,
    /// Physical base address of the register window (hex or decimal).
    #[arg(long, global = true, value_parser = parse_address)]
    base_addr: Option<u64>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Read and decode the status register.
    Status,
    /// Stage every parameter for a channel, then apply.
    Configure {
        /// Channel: a, b or both.
        #[arg(short, long, default_value = "a")]
        channel: Channel,
        /// Waveform: dc, sine, sawtooth, triangle, square or arb.
        #[arg(short, long, default_value = "sine")]
        mode: WaveformMode,
        /// Frequency in Hz (100 µHz resolution).
        #[arg(short, long, default_value_t = 1000.0)]
        frequency: f64,
        /// Amplitude, 0–32767.
        #[arg(short, long, default_value_t = 32_767)]
        amplitude: u16,
        /// Signed DC offset.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i16,
        /// Duty cycle in percent.
        #[arg(short, long, default_value_t = 50.0)]
        duty: f64,
        /// Phase offset in degrees, -180 to 180.
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        phase: f64,
        /// Burst length in cycles (0 = continuous).
        #[arg(long, default_value_t = 0)]
        cycles: u16,
        /// Poll until the reconfigure copy finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Apply a built-in 1 kHz preset: sine, square, triangle or sawtooth.
    Preset {
        preset: Preset,
        #[arg(short, long, default_value = "a")]
        channel: Channel,
        /// Enable and trigger after applying.
        #[arg(long)]
        start: bool,
    },
    /// Enable output and trigger.
    Start(ChannelArg),
    /// Disable output.
    Stop(ChannelArg),
    /// Pulse trigger (synchronised start of enabled channels).
    Trigger(ChannelArg),
    /// Pulse soft reset (clears phase accumulator and cycle count).
    Reset(ChannelArg),
    /// Commit staged parameters to the active bank.
    Apply {
        /// Poll until the reconfigure copy finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Load arbitrary samples from a text file (one per line, decimal or 0x hex).
    LoadArb {
        file: PathBuf,
        /// First sample index.
        #[arg(long, default_value_t = 0)]
        start: u32,
    },
    /// Load one generated sine period into arbitrary memory.
    LoadSine {
        /// Samples per period.
        #[arg(long, default_value_t = 1024)]
        samples: usize,
        /// Peak amplitude around midscale.
        #[arg(long, default_value_t = 32_767)]
        amplitude: u16,
    },
    /// Print or write the quarter-sine DDS ROM in COE format.
    Lut {
        /// Bits per entry.
        #[arg(long, default_value_t = waveform::DEFAULT_LUT_WIDTH)]
        width: u32,
        /// Entries over the quarter wave.
        #[arg(long, default_value_t = waveform::DEFAULT_LUT_DIVISIONS)]
        divisions: usize,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ChannelArg {
    /// Channel: a, b or both.
    #[arg(short, long, default_value = "both")]
    channel: Channel,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Cmd::Lut { width, divisions, out } = &cli.command {
        return cmd_lut(*width, *divisions, out.as_deref());
    }

    let config = driver_config(&cli.target)?;
    let mut wg = open(&config)?;

    match cli.command {
        Cmd::Status => cmd_status(&wg)?,
        Cmd::Configure {
            channel,
            mode,
            frequency,
            amplitude,
            offset,
            duty,
            phase,
            cycles,
            wait,
        } => {
            let params = ChannelParameters {
                mode,
                frequency: hz_to_units(frequency),
                amplitude,
                offset,
                duty_cycle: duty_from_percent(duty),
                phase_offset: phase_from_degrees(phase),
                cycles,
            };
            wg.configure(channel, &params)
                .with_context(|| format!("configuring channel {channel}"))?;
            println!(
                "{channel}: {} {:.4} Hz amp={} offset={} duty={:.1}% phase={:.2}° cycles={}",
                params.mode,
                params.frequency_hz(),
                params.amplitude,
                params.offset,
                params.duty_percent(),
                params.phase_degrees(),
                params.cycles
            );
            if wait {
                settle(&wg, &config)?;
            }
        }
        Cmd::Preset { preset, channel, start } => {
            wg.apply_preset(channel, preset)
                .with_context(|| format!("applying {preset:?} to channel {channel}"))?;
            if start {
                settle(&wg, &config)?;
                wg.start(channel)?;
            }
            println!("{channel}: {preset:?} applied{}", if start { " and started" } else { "" });
        }
        Cmd::Start(ChannelArg { channel }) => {
            wg.start(channel)?;
            println!("{channel}: started");
        }
        Cmd::Stop(ChannelArg { channel }) => {
            wg.stop(channel)?;
            println!("{channel}: stopped");
        }
        Cmd::Trigger(ChannelArg { channel }) => {
            wg.trigger(channel)?;
            println!("{channel}: triggered");
        }
        Cmd::Reset(ChannelArg { channel }) => {
            wg.reset(channel)?;
            println!("{channel}: reset");
        }
        Cmd::Apply { wait } => {
            wg.apply().context("reconfigure strobe")?;
            if wait {
                settle(&wg, &config)?;
            }
            println!("Applied");
        }
        Cmd::LoadArb { file, start } => cmd_load_arb(&mut wg, &file, start)?,
        Cmd::LoadSine { samples, amplitude } => {
            let block = waveform::sine_samples(samples, amplitude);
            wg.load_waveform(&block, 0)
                .with_context(|| format!("loading {samples}-sample sine"))?;
            println!("Loaded {} sine samples (depth {})", block.len(), block.len());
        }
        Cmd::Lut { .. } => unreachable!("handled before opening the device"),
    }

    Ok(())
}

fn parse_address(text: &str) -> std::result::Result<u64, String> {
    parse_u64(text).ok_or_else(|| format!("'{text}' is not a decimal or 0x-hex address"))
}

fn driver_config(target: &Target) -> Result<DriverConfig> {
    let mut config = DriverConfig::from_env().context("reading WAVEGEN_* environment")?;
    if let Some(backend) = target.backend {
        config.backend = backend;
    }
    if let Some(device) = &target.device {
        config.device_path.clone_from(device);
    }
    if let Some(mem) = &target.mem {
        config.mem_path.clone_from(mem);
    }
    if let Some(addr) = target.base_addr {
        config.base_addr = addr;
    }
    Ok(config)
}

fn open(config: &DriverConfig) -> Result<Engine> {
    let backend = select_backend(config.backend, config)
        .with_context(|| format!("opening {:?} backend", config.backend))?;
    tracing::info!("Backend: {}", backend.backend_type());
    Ok(Wavegen::new(backend))
}

fn settle(wg: &Engine, config: &DriverConfig) -> Result<()> {
    let status = wait_for_reconfig(wg, &config.poll).context("waiting for reconfigure")?;
    tracing::debug!("Settled: {status}");
    Ok(())
}

fn cmd_status(wg: &Engine) -> Result<()> {
    let status = wg.get_status()?;
    let flag = |b: bool| if b { "yes" } else { "no" };
    println!("Backend        : {}", wg.backend()?.backend_type());
    println!("Raw            : {:#010x}", status.raw);
    println!("Ready          : {}", flag(status.ready));
    println!("Reconfig busy  : {}", flag(status.reconfig_busy));
    println!("Channel A      : {}", if status.channel_a_running { "running" } else { "idle" });
    println!("Channel B      : {}", if status.channel_b_running { "running" } else { "idle" });
    Ok(())
}

fn cmd_load_arb(wg: &mut Engine, file: &Path, start: u32) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let samples = parse_samples(&text).with_context(|| format!("parsing {}", file.display()))?;
    if samples.len() > MAX_ARB_SAMPLES {
        bail!(
            "{} holds {} samples; one load takes at most {MAX_ARB_SAMPLES}",
            file.display(),
            samples.len()
        );
    }
    wg.load_waveform(&samples, start)
        .context("arbitrary waveform transfer")?;
    println!("Loaded {} samples at index {start}", samples.len());
    Ok(())
}

/// One sample per line; blank lines and `#` comments skipped.
fn parse_samples(text: &str) -> Result<Vec<u16>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| {
            parse_u64(line)
                .and_then(|v| u16::try_from(v).ok())
                .with_context(|| format!("line {n}: '{line}' is not a 16-bit sample"))
        })
        .collect()
}

fn cmd_lut(width: u32, divisions: usize, out: Option<&Path>) -> Result<()> {
    let lut = waveform::quarter_sine_lut(width, divisions)?;
    let coe = waveform::to_coe(&lut, width);
    match out {
        Some(path) => {
            std::fs::write(path, coe).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {divisions} × {width}-bit entries to {}", path.display());
        }
        None => print!("{coe}"),
    }
    Ok(())
}

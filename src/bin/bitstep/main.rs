//! bitstep - procedural chiptune step sequencer
//!
//! Run with: cargo run -- play --style boss

mod app;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bitstep::config::Library;
use bitstep::engine::{AudioClock, NoteSink};
use bitstep::profile::BitMode;
use bitstep::sequencing::NoteEvent;
use bitstep::session::Session;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "bitstep.log";
const DEFAULT_FILTER: &str = "bitstep=info";

/// Procedural multi-voice step sequencer with era-constrained synthesis
#[derive(Parser)]
#[command(name = "bitstep", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the audio device and the terminal UI
    Play {
        /// Style preset to generate on start
        #[arg(long)]
        style: Option<String>,
        /// Seed for the pattern generator (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// JSON file replacing the built-in scales, progressions and presets
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Render a WAV file without opening the audio device
    Export {
        path: PathBuf,
        /// Seconds of audio; one loop when omitted
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        /// Era tier: 8, 16 or 32
        #[arg(long, default_value_t = 32)]
        bit_mode: u32,
        #[arg(long)]
        library: Option<PathBuf>,
    },
}

fn init_tracing(to_file: bool) -> EyreResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if to_file {
        // The TUI owns the terminal; logs go beside it.
        let file = File::create(LOG_FILE).wrap_err("failed to create log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn load_library(path: Option<&Path>) -> EyreResult<Library> {
    match path {
        None => Ok(Library::builtin()),
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            Library::from_json(&json).wrap_err("invalid library file")
        }
    }
}

fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Clock and sink for sessions that never play.
struct Headless;

impl AudioClock for Headless {
    fn now(&self) -> f64 {
        0.0
    }
}

impl NoteSink for Headless {
    fn schedule(&mut self, _event: NoteEvent) {}
    fn set_bit_mode(&mut self, _mode: BitMode) {}
    fn silence(&mut self) {}
}

fn export(
    path: &Path,
    duration: Option<f64>,
    style: Option<&str>,
    seed: u64,
    tier: u32,
    library: Library,
) -> EyreResult<()> {
    let mut session = Session::new(library, Arc::new(Headless), Headless, seed);
    let style = style.map_or_else(|| session.library().presets()[0].name.clone(), str::to_owned);
    session.generate(&style);
    let mode = session.set_bit_mode(tier);

    let summary = session
        .export_now(path, duration)
        .wrap_err_with(|| format!("export to {} failed", path.display()))?;
    println!(
        "wrote {} ({:.2} s, {} frames, {}, seed {seed})",
        path.display(),
        summary.seconds,
        summary.frames,
        mode.label(),
    );
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            style,
            seed,
            library,
        } => {
            init_tracing(true)?;
            let library = load_library(library.as_deref())?;
            app::run(library, style, seed_or_random(seed))
        }
        Command::Export {
            path,
            duration,
            style,
            seed,
            bit_mode,
            library,
        } => {
            init_tracing(false)?;
            let library = load_library(library.as_deref())?;
            export(
                &path,
                duration,
                style.as_deref(),
                seed_or_random(seed),
                bit_mode,
                library,
            )
        }
    }
}

//! The session: one explicit context object owning everything a front end
//! drives.
//!
//! The session is the only writer of the shared composition. The transport's
//! tick thread and export workers only read it. Anything that happens off
//! the caller's thread comes back as a [`Notification`] on a bounded channel
//! that is never waited on by the producer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{error, info, warn};

use crate::config::{Library, StylePreset};
use crate::dsp::oscillator::Timbre;
use crate::engine::transport::{AudioClock, NoteSink, Transport, TransportConfig};
use crate::error::{ExportError, PatternError, TempoError, TransportError};
use crate::export::{wav, ExportSummary, Exporter};
use crate::generate::{GenerationParams, Generator};
use crate::profile::BitMode;
use crate::sequencing::composition::{self, step_duration, Composition, SharedComposition, Voice};
use crate::theory::build_chord_map;

/// Bound on undelivered notifications; producers drop rather than wait.
pub const NOTIFICATION_CAPACITY: usize = 256;

const RANDOM_DENSITY: std::ops::RangeInclusive<u8> = 40..=90;

#[derive(Debug)]
pub enum Notification {
    /// `step` is about to sound at `time` on the audio clock.
    StepAdvanced { step: usize, time: f64 },
    /// A non-looping pass reached its end.
    PlaybackFinished,
    ExportComplete { path: PathBuf, summary: ExportSummary },
    ExportFailed { path: PathBuf, error: ExportError },
}

/// Musical choices behind the current pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInfo {
    pub style: String,
    pub scale: String,
    pub progression: String,
    pub root: u8,
    pub density: u8,
}

pub struct Session<C: AudioClock, S: NoteSink> {
    library: Library,
    composition: SharedComposition,
    generator: Generator<Pcg32>,
    transport: Transport<C, S>,
    exporter: Exporter,
    notify_tx: Sender<Notification>,
    notify_rx: Receiver<Notification>,
    current: Option<GenerationInfo>,
}

impl<C: AudioClock, S: NoteSink> Session<C, S> {
    pub fn new(library: Library, clock: Arc<C>, sink: S, seed: u64) -> Self {
        Self::with_config(library, clock, sink, seed, TransportConfig::default())
    }

    pub fn with_config(
        library: Library,
        clock: Arc<C>,
        sink: S,
        seed: u64,
        config: TransportConfig,
    ) -> Self {
        let (notify_tx, notify_rx) = crossbeam_channel::bounded(NOTIFICATION_CAPACITY);
        let composition = composition::shared(Composition::default());
        let transport = Transport::new(
            clock,
            sink,
            Arc::clone(&composition),
            notify_tx.clone(),
            config,
        );
        info!(seed, "session created");
        Self {
            library,
            composition,
            generator: Generator::new(Pcg32::seed_from_u64(seed)),
            transport,
            exporter: Exporter::default(),
            notify_tx,
            notify_rx,
            current: None,
        }
    }

    /// Replace the default exporter (e.g. a different sample rate).
    pub fn set_exporter(&mut self, exporter: Exporter) {
        self.exporter = exporter;
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn composition(&self) -> &SharedComposition {
        &self.composition
    }

    /// A copy of the composition as it stands now.
    pub fn snapshot(&self) -> Composition {
        composition::read(&self.composition).clone()
    }

    pub fn notifications(&self) -> Receiver<Notification> {
        self.notify_rx.clone()
    }

    pub fn current(&self) -> Option<&GenerationInfo> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn playhead(&self) -> usize {
        self.transport.playhead()
    }

    /// Regenerate every voice with a named preset and its own scale,
    /// progression, root, density, tempo and timbres.
    pub fn generate(&mut self, style: &str) -> &GenerationInfo {
        let preset = self.library.preset(style).clone();
        let info = GenerationInfo {
            style: preset.name.clone(),
            scale: preset.scale.clone(),
            progression: preset.progression.clone(),
            root: preset.root % 12,
            density: preset.density.min(100),
        };
        self.compose(&preset, info)
    }

    /// Regenerate with a random preset, scale, root, progression and density.
    pub fn randomize(&mut self) -> &GenerationInfo {
        let rng = self.generator.rng_mut();
        let preset_index = rng.random_range(0..self.library.presets().len());
        let scale_index = rng.random_range(0..self.library.scales().len());
        let progression_index = rng.random_range(0..self.library.progressions().len());
        let root = rng.random_range(0..12u8);
        let density = rng.random_range(RANDOM_DENSITY);

        let preset = self.library.presets()[preset_index].clone();
        let info = GenerationInfo {
            style: preset.name.clone(),
            scale: self.library.scales()[scale_index].name.clone(),
            progression: self.library.progressions()[progression_index].name.clone(),
            root,
            density,
        };
        self.compose(&preset, info)
    }

    fn compose(&mut self, preset: &StylePreset, info: GenerationInfo) -> &GenerationInfo {
        let scale = self.library.scale(&info.scale);
        let progression = self.library.progression(&info.progression);
        let chords = build_chord_map(&scale.intervals, info.root, &progression.chords);
        let params = GenerationParams {
            intervals: &scale.intervals,
            root: info.root,
            density: info.density,
            chords: &chords,
        };

        // Compose outside the lock; readers only ever see a finished pattern.
        let mut pattern = composition::read(&self.composition).pattern.clone();
        self.generator.generate_all(&mut pattern, &preset.style, &params);

        {
            let mut composition = composition::write(&self.composition);
            composition.pattern = pattern;
            if step_duration(preset.tempo).is_ok() {
                composition.bpm = preset.tempo;
            } else {
                warn!(style = %preset.name, tempo = preset.tempo, "preset tempo invalid, keeping current");
            }
            for (voice, &timbre) in Voice::ALL.iter().zip(preset.timbres.iter()) {
                composition.settings_mut(*voice).timbre = timbre;
            }
        }

        info!(
            style = %info.style,
            scale = %info.scale,
            progression = %info.progression,
            root = info.root,
            density = info.density,
            "pattern generated"
        );
        self.current.insert(info)
    }

    pub fn clear(&mut self) {
        composition::write(&self.composition).pattern.clear();
        info!("pattern cleared");
    }

    pub fn set_cell(
        &mut self,
        voice: Voice,
        pitch: u8,
        step: usize,
        active: bool,
    ) -> Result<(), PatternError> {
        composition::write(&self.composition)
            .pattern
            .set_cell(voice, pitch, step, active)
    }

    /// Rejects non-positive and non-finite tempos; the current tempo stays.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), TempoError> {
        step_duration(bpm)?;
        composition::write(&self.composition).bpm = bpm;
        Ok(())
    }

    pub fn tempo(&self) -> f64 {
        composition::read(&self.composition).bpm
    }

    /// Select an era by tier number; unknown tiers fall back to 32-bit.
    pub fn set_bit_mode(&mut self, tier: u32) -> BitMode {
        let mode = BitMode::from_tier(tier);
        composition::write(&self.composition).bit_mode = mode;
        if !self.transport.is_playing() {
            self.transport.set_bit_mode(mode);
        }
        mode
    }

    pub fn set_looping(&mut self, looping: bool) {
        composition::write(&self.composition).looping = looping;
    }

    pub fn set_muted(&mut self, voice: Voice, muted: bool) {
        composition::write(&self.composition).settings_mut(voice).muted = muted;
    }

    pub fn set_solo(&mut self, voice: Voice, solo: bool) {
        composition::write(&self.composition).settings_mut(voice).solo = solo;
    }

    pub fn set_timbre(&mut self, voice: Voice, timbre: Timbre) {
        composition::write(&self.composition).settings_mut(voice).timbre = timbre;
    }

    pub fn set_gain(&mut self, voice: Voice, gain: f32) {
        composition::write(&self.composition).settings_mut(voice).gain = gain.clamp(0.0, 1.0);
    }

    pub fn play(&mut self) -> Result<(), TransportError> {
        self.transport.play()
    }

    pub fn stop(&mut self) {
        self.transport.stop();
    }

    /// Export on the caller's thread.
    pub fn export_now(
        &self,
        path: &Path,
        duration: Option<f64>,
    ) -> Result<ExportSummary, ExportError> {
        self.exporter
            .export_to_path(&self.snapshot(), duration, path)
    }

    /// Export on a worker thread against a snapshot of the composition.
    ///
    /// Tempo, duration and output size are checked here and rejected synchronously. The
    /// outcome of the render arrives as `ExportComplete` or `ExportFailed`.
    pub fn export_to(
        &self,
        path: impl Into<PathBuf>,
        duration: Option<f64>,
    ) -> Result<JoinHandle<()>, ExportError> {
        let snapshot = self.snapshot();
        let step = snapshot.step_duration()?;
        let loop_frames =
            crate::export::render::loop_frames(step, self.exporter.sample_rate()) as u64;
        let frames = self.exporter.total_frames(duration, loop_frames)?;
        wav::data_len(frames)?;

        let path = path.into();
        let exporter = self.exporter;
        let notify = self.notify_tx.clone();
        let handle = thread::spawn(move || {
            let notification = match exporter.export_to_path(&snapshot, duration, &path) {
                Ok(summary) => Notification::ExportComplete { path, summary },
                Err(err) => {
                    error!(%err, path = %path.display(), "export failed");
                    Notification::ExportFailed { path, error: err }
                }
            };
            match notify.try_send(notification) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => warn!("export notification dropped, receiver is behind"),
            }
        });
        Ok(handle)
    }
}

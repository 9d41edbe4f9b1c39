//! The composition: everything playback and export read.
//!
//! One `Composition` lives behind an `Arc<RwLock<_>>` shared by the session
//! (sole writer), the transport's tick thread and export workers (readers).
//! Readers take the lock once per step, so an edit becomes audible at most
//! one lookahead window after it lands.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Timbre;
use crate::error::TempoError;
use crate::profile::{clamp_timbre, BitMode};
use crate::sequencing::pattern::PatternStore;
use crate::VOICE_COUNT;

/// The four fixed parts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Lead,
    Bass,
    Arp,
    Percussion,
}

impl Voice {
    pub const ALL: [Voice; VOICE_COUNT] = [Voice::Lead, Voice::Bass, Voice::Arp, Voice::Percussion];

    pub fn index(self) -> usize {
        match self {
            Voice::Lead => 0,
            Voice::Bass => 1,
            Voice::Arp => 2,
            Voice::Percussion => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Voice::Lead => "lead",
            Voice::Bass => "bass",
            Voice::Arp => "arp",
            Voice::Percussion => "drums",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    /// Requested timbre; the active era may substitute a fallback.
    pub timbre: Timbre,
    pub gain: f32,
    pub muted: bool,
    pub solo: bool,
}

impl VoiceSettings {
    fn new(timbre: Timbre, gain: f32) -> Self {
        Self {
            timbre,
            gain,
            muted: false,
            solo: false,
        }
    }

    pub fn defaults() -> [VoiceSettings; VOICE_COUNT] {
        [
            VoiceSettings::new(Timbre::Square, 0.35),
            VoiceSettings::new(Timbre::Triangle, 0.45),
            VoiceSettings::new(Timbre::Pulse, 0.25),
            VoiceSettings::new(Timbre::Noise, 0.3),
        ]
    }
}

/// One note handed to a signal chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub voice: Voice,
    pub pitch: u8,
    pub timbre: Timbre,
    pub gain: f32,
    /// Start time in seconds on the receiving chain's clock.
    pub time: f64,
    /// Seconds for the envelope to decay to the floor.
    pub duration: f64,
}

/// Seconds per step at `bpm` (16th-note resolution).
pub fn step_duration(bpm: f64) -> Result<f64, TempoError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(TempoError::Invalid(bpm));
    }
    Ok(60.0 / bpm / 4.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub pattern: PatternStore,
    pub voices: [VoiceSettings; VOICE_COUNT],
    pub bit_mode: BitMode,
    pub bpm: f64,
    pub looping: bool,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            pattern: PatternStore::new(),
            voices: VoiceSettings::defaults(),
            bit_mode: BitMode::default(),
            bpm: 120.0,
            looping: true,
        }
    }
}

impl Composition {
    pub fn settings(&self, voice: Voice) -> &VoiceSettings {
        &self.voices[voice.index()]
    }

    pub fn settings_mut(&mut self, voice: Voice) -> &mut VoiceSettings {
        &mut self.voices[voice.index()]
    }

    pub fn step_duration(&self) -> Result<f64, TempoError> {
        step_duration(self.bpm)
    }

    /// Muted voices never sound; while any voice is soloed only soloed voices do.
    pub fn is_audible(&self, voice: Voice) -> bool {
        let any_solo = self.voices.iter().any(|v| v.solo);
        let settings = self.settings(voice);
        !settings.muted && (!any_solo || settings.solo)
    }

    /// Notes that sound on `step`, starting at `time`.
    ///
    /// Applies mute/solo, the era's timbre fallback and its polyphony cap
    /// (first N pitches in stored order).
    pub fn step_events(&self, step: usize, time: f64, duration: f64) -> Vec<NoteEvent> {
        let max_poly = self.bit_mode.profile().max_polyphony;
        let mut events = Vec::new();

        for voice in Voice::ALL {
            if !self.is_audible(voice) {
                continue;
            }
            let settings = self.settings(voice);
            let timbre = clamp_timbre(settings.timbre, self.bit_mode);
            events.extend(
                self.pattern
                    .cell(voice, step)
                    .notes()
                    .iter()
                    .take(max_poly)
                    .map(|&pitch| NoteEvent {
                        voice,
                        pitch,
                        timbre,
                        gain: settings.gain,
                        time,
                        duration,
                    }),
            );
        }
        events
    }
}

pub type SharedComposition = Arc<RwLock<Composition>>;

pub fn shared(composition: Composition) -> SharedComposition {
    Arc::new(RwLock::new(composition))
}

/// Read access; a writer that panicked leaves plain data behind, so poisoning is ignored.
pub fn read(composition: &SharedComposition) -> RwLockReadGuard<'_, Composition> {
    composition.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write(composition: &SharedComposition) -> RwLockWriteGuard<'_, Composition> {
    composition.write().unwrap_or_else(PoisonError::into_inner)
}

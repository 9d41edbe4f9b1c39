//! Lookup tables: scales, chord progressions and style presets.
//!
//! The core treats all three as opaque configuration. Each table is an
//! ordered list of named entries and its first entry is the fallback for an
//! unknown key, so a table may never be empty.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::oscillator::Timbre;
use crate::error::ConfigError;
use crate::generate::style::{
    ArpDescriptor, ArpStyle, BassDescriptor, BassStyle, DrumDescriptor, HatPattern,
    LeadDescriptor, LeadStyle, StyleDescriptor,
};
use crate::theory::ChordSpec;
use crate::VOICE_COUNT;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub name: String,
    /// Semitone offsets from the root.
    pub intervals: Vec<u8>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub name: String,
    pub chords: Vec<ChordSpec>,
}

/// Per-voice styles plus the musical defaults that go with them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StylePreset {
    pub name: String,
    pub scale: String,
    pub progression: String,
    /// Root pitch class, 0 = C.
    pub root: u8,
    pub density: u8,
    pub tempo: f64,
    /// Lead, bass, arp, percussion.
    pub timbres: [Timbre; VOICE_COUNT],
    #[cfg_attr(feature = "serde", serde(default))]
    pub style: StyleDescriptor,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    scales: Vec<Scale>,
    progressions: Vec<Progression>,
    presets: Vec<StylePreset>,
}

impl Library {
    pub fn new(
        scales: Vec<Scale>,
        progressions: Vec<Progression>,
        presets: Vec<StylePreset>,
    ) -> Result<Self, ConfigError> {
        if scales.is_empty() {
            return Err(ConfigError::EmptyTable("scales"));
        }
        if progressions.is_empty() {
            return Err(ConfigError::EmptyTable("progressions"));
        }
        if presets.is_empty() {
            return Err(ConfigError::EmptyTable("presets"));
        }
        Ok(Self {
            scales,
            progressions,
            presets,
        })
    }

    /// Load a replacement table set.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: Library = serde_json::from_str(json)?;
        Self::new(raw.scales, raw.progressions, raw.presets)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn scales(&self) -> &[Scale] {
        &self.scales
    }

    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }

    pub fn presets(&self) -> &[StylePreset] {
        &self.presets
    }

    /// Scale by name, or the first scale.
    pub fn scale(&self, name: &str) -> &Scale {
        lookup(&self.scales, name, |s| &s.name, "scale")
    }

    /// Progression by name, or the first progression.
    pub fn progression(&self, name: &str) -> &Progression {
        lookup(&self.progressions, name, |p| &p.name, "progression")
    }

    /// Preset by name, or the first preset.
    pub fn preset(&self, name: &str) -> &StylePreset {
        lookup(&self.presets, name, |p| &p.name, "style")
    }

    /// Preset after `name` in table order, wrapping around.
    pub fn next_preset(&self, name: &str) -> &StylePreset {
        let index = self
            .presets
            .iter()
            .position(|p| p.name == name)
            .map_or(0, |i| (i + 1) % self.presets.len());
        &self.presets[index]
    }
}

fn lookup<'a, T>(
    table: &'a [T],
    name: &str,
    key: impl Fn(&T) -> &String,
    kind: &'static str,
) -> &'a T {
    if let Some(entry) = table.iter().find(|entry| key(entry) == name) {
        return entry;
    }
    // Tables are non-empty by construction.
    let fallback = &table[0];
    warn!(kind, requested = name, fallback = key(fallback).as_str(), "unknown key, using default");
    fallback
}

fn scale(name: &str, intervals: &[u8]) -> Scale {
    Scale {
        name: name.to_owned(),
        intervals: intervals.to_vec(),
    }
}

fn progression(name: &str, chords: Vec<ChordSpec>) -> Progression {
    Progression {
        name: name.to_owned(),
        chords,
    }
}

struct PresetSeed {
    name: &'static str,
    scale: &'static str,
    progression: &'static str,
    root: u8,
    density: u8,
    tempo: f64,
    timbres: [Timbre; VOICE_COUNT],
}

impl PresetSeed {
    fn with(self, style: StyleDescriptor) -> StylePreset {
        StylePreset {
            name: self.name.to_owned(),
            scale: self.scale.to_owned(),
            progression: self.progression.to_owned(),
            root: self.root,
            density: self.density,
            tempo: self.tempo,
            timbres: self.timbres,
            style,
        }
    }
}

fn lead(style: LeadStyle, jump_weights: [f64; 3], rest: f64, speed: usize) -> LeadDescriptor {
    LeadDescriptor {
        style,
        jump_weights,
        rest,
        speed,
    }
}

fn bass(style: BassStyle, rest: f64) -> BassDescriptor {
    BassDescriptor {
        style,
        rest,
        speed: 1,
    }
}

fn arp(style: ArpStyle, rest: f64, speed: usize) -> ArpDescriptor {
    ArpDescriptor {
        style,
        rest,
        speed,
        ..ArpDescriptor::default()
    }
}

fn drums(kick: &[usize], snare: &[usize], hat: HatPattern, fill: f64) -> DrumDescriptor {
    DrumDescriptor {
        kick: kick.to_vec(),
        snare: snare.to_vec(),
        hat,
        fill,
        ..DrumDescriptor::default()
    }
}

impl Library {
    /// The shipped tables: 10 scales, 7 progressions, 13 presets.
    pub fn builtin() -> Self {
        use ChordSpec as C;
        use Timbre::*;

        let scales = vec![
            scale("major", &[0, 2, 4, 5, 7, 9, 11]),
            scale("minor", &[0, 2, 3, 5, 7, 8, 10]),
            scale("dorian", &[0, 2, 3, 5, 7, 9, 10]),
            scale("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
            scale("lydian", &[0, 2, 4, 6, 7, 9, 11]),
            scale("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
            scale("harmonic_minor", &[0, 2, 3, 5, 7, 8, 11]),
            scale("major_pentatonic", &[0, 2, 4, 7, 9]),
            scale("minor_pentatonic", &[0, 3, 5, 7, 10]),
            scale("blues", &[0, 3, 5, 6, 7, 10]),
        ];

        let progressions = vec![
            progression(
                "pop",
                vec![C::triad(0, 25.0), C::triad(4, 25.0), C::triad(5, 25.0), C::triad(3, 25.0)],
            ),
            progression(
                "cadence",
                vec![C::triad(0, 25.0), C::triad(3, 25.0), C::triad(4, 25.0), C::triad(0, 25.0)],
            ),
            progression(
                "minor_drive",
                vec![C::triad(0, 25.0), C::triad(5, 25.0), C::triad(2, 25.0), C::triad(6, 25.0)],
            ),
            progression(
                "jazz",
                vec![
                    C::seventh(1, 25.0),
                    C::seventh(4, 25.0),
                    C::seventh(0, 25.0),
                    C::seventh(5, 25.0),
                ],
            ),
            progression(
                "blues",
                vec![
                    C::seventh(0, 50.0),
                    C::seventh(3, 25.0),
                    C::seventh(0, 13.0),
                    C::seventh(4, 12.0),
                ],
            ),
            progression("tension", vec![C::triad(0, 50.0), C::triad(1, 50.0)]),
            progression("drone", vec![C::triad(0, 100.0)]),
        ];

        let presets = vec![
            PresetSeed {
                name: "overworld",
                scale: "major",
                progression: "pop",
                root: 0,
                density: 75,
                tempo: 132.0,
                timbres: [Square, Triangle, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Walk, [0.6, 0.3, 0.1], 0.1, 1),
                bass: bass(BassStyle::RootFifth, 0.05),
                arp: arp(ArpStyle::Cycle, 0.1, 2),
                drums: drums(&[0], &[4], HatPattern::Eighth, 0.15),
            }),
            PresetSeed {
                name: "dungeon",
                scale: "phrygian",
                progression: "tension",
                root: 4,
                density: 55,
                tempo: 96.0,
                timbres: [Pulse, Triangle, Square, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Creep, [1.0, 0.0, 0.0], 0.2, 1),
                bass: bass(BassStyle::Drone, 0.1),
                arp: arp(ArpStyle::Dissonant, 0.4, 4),
                drums: drums(&[0], &[], HatPattern::Sparse, 0.05),
            }),
            PresetSeed {
                name: "castle",
                scale: "harmonic_minor",
                progression: "minor_drive",
                root: 2,
                density: 70,
                tempo: 112.0,
                timbres: [Square, Triangle, Sawtooth, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Phrase, [0.5, 0.4, 0.1], 0.1, 1),
                bass: bass(BassStyle::March, 0.0),
                arp: arp(ArpStyle::Fanfare, 0.1, 2),
                drums: drums(&[0, 4], &[6], HatPattern::Eighth, 0.2),
            }),
            PresetSeed {
                name: "boss",
                scale: "minor",
                progression: "minor_drive",
                root: 9,
                density: 90,
                tempo: 160.0,
                timbres: [Sawtooth, Square, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Run, [0.7, 0.3, 0.0], 0.05, 1),
                bass: bass(BassStyle::Driving, 0.0),
                arp: arp(ArpStyle::Power, 0.1, 2),
                drums: drums(&[0, 3], &[4], HatPattern::Sixteenth, 0.3),
            }),
            PresetSeed {
                name: "title",
                scale: "lydian",
                progression: "cadence",
                root: 5,
                density: 65,
                tempo: 120.0,
                timbres: [Square, Triangle, Sine, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Heroic, [0.5, 0.3, 0.2], 0.1, 1),
                bass: bass(BassStyle::Root, 0.05),
                arp: arp(ArpStyle::Comping, 0.05, 1),
                drums: drums(&[0], &[4], HatPattern::Eighth, 0.15),
            }),
            PresetSeed {
                name: "shop",
                scale: "major_pentatonic",
                progression: "pop",
                root: 7,
                density: 60,
                tempo: 104.0,
                timbres: [Pulse, Triangle, Square, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::RepeatHold, [0.7, 0.2, 0.1], 0.1, 1),
                bass: bass(BassStyle::Octave, 0.05),
                arp: arp(ArpStyle::Stab, 0.1, 1),
                drums: drums(&[0], &[4], HatPattern::Swing, 0.1),
            }),
            PresetSeed {
                name: "space",
                scale: "dorian",
                progression: "drone",
                root: 2,
                density: 45,
                tempo: 88.0,
                timbres: [Sine, Triangle, Sine, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Float, [0.1, 0.3, 0.6], 0.25, 2),
                bass: bass(BassStyle::Pulse, 0.1),
                arp: arp(ArpStyle::Shimmer, 0.2, 1),
                drums: drums(&[0], &[], HatPattern::Sparse, 0.05),
            }),
            PresetSeed {
                name: "racing",
                scale: "mixolydian",
                progression: "cadence",
                root: 0,
                density: 85,
                tempo: 168.0,
                timbres: [Square, Sawtooth, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Syncopated, [0.6, 0.3, 0.1], 0.05, 1),
                bass: bass(BassStyle::Syncopated, 0.0),
                arp: arp(ArpStyle::OctaveArp, 0.05, 2),
                drums: drums(&[0, 2], &[4], HatPattern::Sixteenth, 0.25),
            }),
            PresetSeed {
                name: "puzzle",
                scale: "major",
                progression: "jazz",
                root: 3,
                density: 55,
                tempo: 110.0,
                timbres: [Triangle, Triangle, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Trill, [0.7, 0.3, 0.0], 0.15, 2),
                bass: bass(BassStyle::Walking, 0.05),
                arp: arp(ArpStyle::Cycle, 0.2, 2),
                drums: drums(&[0], &[4], HatPattern::Swing, 0.1),
            }),
            PresetSeed {
                name: "town",
                scale: "major",
                progression: "cadence",
                root: 7,
                density: 65,
                tempo: 116.0,
                timbres: [Pulse, Triangle, Square, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Swing, [0.6, 0.3, 0.1], 0.1, 1),
                bass: bass(BassStyle::Arpeggio, 0.05),
                arp: arp(ArpStyle::Comping, 0.1, 1),
                drums: drums(&[0], &[4], HatPattern::Swing, 0.1),
            }),
            PresetSeed {
                name: "night",
                scale: "minor_pentatonic",
                progression: "drone",
                root: 9,
                density: 40,
                tempo: 84.0,
                timbres: [Triangle, Triangle, Sine, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Sparse, [0.5, 0.4, 0.1], 0.3, 1),
                bass: bass(BassStyle::Drone, 0.1),
                arp: arp(ArpStyle::Shimmer, 0.3, 1),
                drums: drums(&[0], &[], HatPattern::Sparse, 0.02),
            }),
            PresetSeed {
                name: "duel",
                scale: "blues",
                progression: "blues",
                root: 4,
                density: 80,
                tempo: 140.0,
                timbres: [Square, Square, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::CallResponse, [0.5, 0.35, 0.15], 0.1, 1),
                bass: bass(BassStyle::Walking, 0.0),
                arp: arp(ArpStyle::Stab, 0.1, 1),
                drums: drums(&[0, 3], &[4], HatPattern::Eighth, 0.25),
            }),
            PresetSeed {
                name: "credits",
                scale: "major",
                progression: "pop",
                root: 5,
                density: 70,
                tempo: 100.0,
                timbres: [Triangle, Triangle, Pulse, Noise],
            }
            .with(StyleDescriptor {
                lead: lead(LeadStyle::Cascade, [0.6, 0.3, 0.1], 0.15, 2),
                bass: bass(BassStyle::RootFifth, 0.05),
                arp: arp(ArpStyle::Fanfare, 0.1, 2),
                drums: drums(&[0], &[4], HatPattern::Eighth, 0.1),
            }),
        ];

        Self {
            scales,
            progressions,
            presets,
        }
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::builtin()
    }
}

//! Style descriptors: per-voice algorithm selectors and their parameters.
//!
//! These are plain configuration. The preset table supplies them; the
//! generator only reads them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lead melody algorithms. All share the rest/density gates, jump-based index
/// advance, chord snap and phrase centering unless noted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LeadStyle {
    /// Plain weighted random walk.
    #[default]
    Walk,
    /// Repeats the previous note often and holds (skips) steps to let it ring.
    RepeatHold,
    /// Avoids downbeats (skips step % 4 == 0 with p = 0.6).
    Syncopated,
    /// Only plays on the long-short pair of each beat (step % 4 in {0, 3}).
    Swing,
    /// Small steps only, on even steps.
    Creep,
    /// Skips most steps (p = 0.6) except every eighth step.
    Sparse,
    /// Keeps walking in one direction, reversing only at the register edges
    /// or with p = 0.15.
    Run,
    /// Second half of each 32-step phrase echoes the first (p = 0.7 per note).
    Phrase,
    /// Sparse like `Sparse`, with wide intervals.
    Float,
    /// Leaps up a fourth or fifth (4 or 5 positions) on every bar downbeat.
    Heroic,
    /// Alternates a note with its upper neighbour; the base moves every 8 steps.
    /// Bypasses the default advance and the chord snap.
    Trill,
    /// Call in the first half of each phrase, answer biased downward with extra
    /// rests in the second.
    CallResponse,
    /// Steps down one position per note and jumps back to the top at the
    /// bottom of the register. Bypasses the default advance and the chord snap.
    Cascade,
}

impl LeadStyle {
    pub const ALL: [LeadStyle; 13] = [
        LeadStyle::Walk,
        LeadStyle::RepeatHold,
        LeadStyle::Syncopated,
        LeadStyle::Swing,
        LeadStyle::Creep,
        LeadStyle::Sparse,
        LeadStyle::Run,
        LeadStyle::Phrase,
        LeadStyle::Float,
        LeadStyle::Heroic,
        LeadStyle::Trill,
        LeadStyle::CallResponse,
        LeadStyle::Cascade,
    ];
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BassStyle {
    /// Chord root on every beat.
    #[default]
    Root,
    /// Root on step 0 and fifth on step 4 of every 8.
    RootFifth,
    /// Walks the chord tones on beats. The step right before a chord change
    /// becomes a chromatic approach whenever it would otherwise be silent,
    /// whether it is off the beat or a beat the rest or density gate dropped.
    Walking,
    /// Root on every eighth; the off-step before a root change becomes a
    /// chromatic approach.
    Driving,
    /// Root on beats, the fifth instead with p = 0.25 away from bar downbeats.
    Drone,
    /// Accents on steps 0, 3, 6, 10 and 12 of every 16.
    Syncopated,
    /// Root/fifth on the 8-step skeleton 0 root, 3 fifth, 4 root, 6 fifth.
    March,
    /// Root every 8 steps; the second of each 16 is the fifth with p = 0.5.
    Pulse,
    /// Root and its octave, alternating on eighths.
    Octave,
    /// Cycles the active chord's tones on eighths.
    Arpeggio,
}

impl BassStyle {
    pub const ALL: [BassStyle; 10] = [
        BassStyle::Root,
        BassStyle::RootFifth,
        BassStyle::Walking,
        BassStyle::Driving,
        BassStyle::Drone,
        BassStyle::Syncopated,
        BassStyle::March,
        BassStyle::Pulse,
        BassStyle::Octave,
        BassStyle::Arpeggio,
    ];
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArpStyle {
    /// Three-note chord clusters on the descriptor's rhythmic slots.
    Comping,
    /// Root and fifth stacked every other step.
    Power,
    /// A chord tone paired with its minor second or tritone.
    Dissonant,
    /// Single chord tones, cycling upward, on eighths.
    Fanfare,
    /// Sparse upper-register tones, sometimes doubled an octave away.
    Shimmer,
    /// Chord clusters on the off-beat (step % 4 == 2).
    Stab,
    /// A chord tone then its octave, alternating.
    OctaveArp,
    /// Single tones in an up, down or ping-pong order picked per generation.
    #[default]
    Cycle,
}

impl ArpStyle {
    pub const ALL: [ArpStyle; 8] = [
        ArpStyle::Comping,
        ArpStyle::Power,
        ArpStyle::Dissonant,
        ArpStyle::Fanfare,
        ArpStyle::Shimmer,
        ArpStyle::Stab,
        ArpStyle::OctaveArp,
        ArpStyle::Cycle,
    ];
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HatPattern {
    /// Every step is a candidate.
    Sixteenth,
    /// Long-short pairs (step % 4 in {0, 3}).
    Swing,
    /// Beats only.
    Sparse,
    /// Every other step.
    #[default]
    Eighth,
}

/// Relative weights of the small (±1), medium (±2..=3) and large (±4..=7)
/// jump buckets.
pub type JumpWeights = [f64; 3];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDescriptor {
    pub style: LeadStyle,
    pub jump_weights: JumpWeights,
    pub rest: f64,
    /// Only steps divisible by `speed` may sound.
    pub speed: usize,
}

impl Default for LeadDescriptor {
    fn default() -> Self {
        Self {
            style: LeadStyle::Walk,
            jump_weights: [0.6, 0.3, 0.1],
            rest: 0.1,
            speed: 1,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BassDescriptor {
    pub style: BassStyle,
    pub rest: f64,
    pub speed: usize,
}

impl Default for BassDescriptor {
    fn default() -> Self {
        Self {
            style: BassStyle::Root,
            rest: 0.05,
            speed: 1,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArpDescriptor {
    pub style: ArpStyle,
    pub rest: f64,
    pub speed: usize,
    /// Comping positions within each 16-step bar.
    pub slots: Vec<usize>,
}

impl Default for ArpDescriptor {
    fn default() -> Self {
        Self {
            style: ArpStyle::Cycle,
            rest: 0.1,
            speed: 2,
            slots: vec![0, 6, 10],
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct DrumDescriptor {
    /// Kick positions, taken mod 8.
    pub kick: Vec<usize>,
    /// Snare positions, taken mod 8.
    pub snare: Vec<usize>,
    pub hat: HatPattern,
    pub rest: f64,
    /// Base probability of a fill hit before the phrase-position multiplier.
    pub fill: f64,
}

impl Default for DrumDescriptor {
    fn default() -> Self {
        Self {
            kick: vec![0],
            snare: vec![4],
            hat: HatPattern::Eighth,
            rest: 0.1,
            fill: 0.15,
        }
    }
}

/// One voice's worth of parameters per voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleDescriptor {
    pub lead: LeadDescriptor,
    pub bass: BassDescriptor,
    pub arp: ArpDescriptor,
    pub drums: DrumDescriptor,
}

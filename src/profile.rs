//! Era profiles ("bit modes").
//!
//! Each tier bundles the constraints of a hardware generation: how coarse the
//! DAC is, how dark the output filter is, how many notes a voice may sound at
//! once, which waveforms exist, and whether the delay and reverb sends are
//! wired up. Both the live chain and the offline renderer read the same table,
//! so a pattern sounds the same in either.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::oscillator::Timbre;

/// Supported tiers, from most to least restrictive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitMode {
    Bit8,
    Bit16,
    #[default]
    Bit32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitProfile {
    /// Quantization levels per unit amplitude; 0 leaves the signal linear.
    pub quantize_levels: u32,
    pub cutoff_hz: f32,
    /// Make-up gain applied after quantization.
    pub output_gain: f32,
    /// Notes per voice per step that actually sound.
    pub max_polyphony: usize,
    pub timbres: &'static [Timbre],
    pub delay: bool,
    pub reverb: bool,
}

const BIT8: BitProfile = BitProfile {
    quantize_levels: 16,
    cutoff_hz: 3_500.0,
    output_gain: 1.25,
    max_polyphony: 1,
    timbres: &[Timbre::Square, Timbre::Pulse, Timbre::Triangle, Timbre::Noise],
    delay: false,
    reverb: false,
};

const BIT16: BitProfile = BitProfile {
    quantize_levels: 128,
    cutoff_hz: 9_000.0,
    output_gain: 1.1,
    max_polyphony: 3,
    timbres: &[
        Timbre::Square,
        Timbre::Pulse,
        Timbre::Triangle,
        Timbre::Sawtooth,
        Timbre::Noise,
    ],
    delay: true,
    reverb: false,
};

const BIT32: BitProfile = BitProfile {
    quantize_levels: 0,
    cutoff_hz: 18_000.0,
    output_gain: 1.0,
    max_polyphony: 8,
    timbres: &Timbre::ALL,
    delay: true,
    reverb: true,
};

impl BitMode {
    pub const ALL: [BitMode; 3] = [BitMode::Bit8, BitMode::Bit16, BitMode::Bit32];

    /// Resolve an externally supplied tier number (8, 16, 32).
    ///
    /// Unknown tiers fall back to the highest-fidelity profile.
    pub fn from_tier(tier: u32) -> Self {
        match tier {
            8 => BitMode::Bit8,
            16 => BitMode::Bit16,
            32 => BitMode::Bit32,
            other => {
                warn!(tier = other, "unknown bit-mode tier, using 32-bit profile");
                BitMode::Bit32
            }
        }
    }

    pub fn tier(self) -> u32 {
        match self {
            BitMode::Bit8 => 8,
            BitMode::Bit16 => 16,
            BitMode::Bit32 => 32,
        }
    }

    pub fn index(self) -> usize {
        match self {
            BitMode::Bit8 => 0,
            BitMode::Bit16 => 1,
            BitMode::Bit32 => 2,
        }
    }

    pub fn profile(self) -> &'static BitProfile {
        match self {
            BitMode::Bit8 => &BIT8,
            BitMode::Bit16 => &BIT16,
            BitMode::Bit32 => &BIT32,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BitMode::Bit8 => "8-bit",
            BitMode::Bit16 => "16-bit",
            BitMode::Bit32 => "32-bit",
        }
    }
}

/// Static degradation path for timbres a tier lacks.
fn fallback(timbre: Timbre) -> Option<Timbre> {
    match timbre {
        Timbre::Sawtooth => Some(Timbre::Square),
        Timbre::Sine => Some(Timbre::Triangle),
        Timbre::Pulse => Some(Timbre::Square),
        _ => None,
    }
}

impl BitProfile {
    pub fn allows(&self, timbre: Timbre) -> bool {
        self.timbres.contains(&timbre)
    }

    /// Requested timbre if allowed, otherwise follow the fallback table,
    /// ending on square.
    pub fn clamp_timbre(&self, requested: Timbre) -> Timbre {
        let mut candidate = requested;
        loop {
            if self.allows(candidate) {
                return candidate;
            }
            match fallback(candidate) {
                Some(next) => candidate = next,
                None => return Timbre::Square,
            }
        }
    }
}

/// Timbre a voice will actually sound with under `mode`.
pub fn clamp_timbre(requested: Timbre, mode: BitMode) -> Timbre {
    mode.profile().clamp_timbre(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_timbre_is_unchanged() {
        assert_eq!(clamp_timbre(Timbre::Triangle, BitMode::Bit8), Timbre::Triangle);
        assert_eq!(clamp_timbre(Timbre::Sine, BitMode::Bit32), Timbre::Sine);
    }

    #[test]
    fn saw_degrades_to_square_and_sine_to_triangle() {
        assert_eq!(clamp_timbre(Timbre::Sawtooth, BitMode::Bit8), Timbre::Square);
        assert_eq!(clamp_timbre(Timbre::Sine, BitMode::Bit8), Timbre::Triangle);
        assert_eq!(clamp_timbre(Timbre::Sine, BitMode::Bit16), Timbre::Triangle);
        assert_eq!(clamp_timbre(Timbre::Sawtooth, BitMode::Bit16), Timbre::Sawtooth);
    }

    #[test]
    fn restrictive_tier_only_yields_permitted_timbres() {
        for mode in BitMode::ALL {
            let profile = mode.profile();
            for timbre in Timbre::ALL {
                assert!(profile.allows(profile.clamp_timbre(timbre)));
            }
        }
    }

    #[test]
    fn unknown_tier_uses_highest_fidelity() {
        assert_eq!(BitMode::from_tier(8), BitMode::Bit8);
        assert_eq!(BitMode::from_tier(16), BitMode::Bit16);
        assert_eq!(BitMode::from_tier(4), BitMode::Bit32);
        assert_eq!(BitMode::from_tier(64), BitMode::Bit32);
    }

    #[test]
    fn tiers_get_more_permissive() {
        let polys: Vec<usize> = BitMode::ALL
            .iter()
            .map(|m| m.profile().max_polyphony)
            .collect();
        assert!(polys.windows(2).all(|w| w[0] < w[1]));
        assert!(!BitMode::Bit8.profile().delay);
        assert!(BitMode::Bit32.profile().reverb);
        assert_eq!(BitMode::Bit32.profile().quantize_levels, 0);
    }
}

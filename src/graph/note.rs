use crate::dsp::envelope::DecayEnvelope;
use crate::dsp::oscillator::{NoiseBuffer, NoisePlayer, Oscillator, Timbre};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Sequenced Note
==============

The whole instrument for one note: a source and a decay envelope.

  source ──> × envelope ──> out

  source     Oscillator for the pitched timbres, or a read head into the
             chain's shared noise buffer for Noise.
  envelope   Starts at the voice gain, decays to the floor in one step.

There is no release stage: a note is over when its envelope is, and the pool
frees the voice on the next block.
*/

pub struct NoteGraph {
    osc: Oscillator,
    noise_player: NoisePlayer,
    noise: NoiseBuffer,
    env: DecayEnvelope,
}

impl NoteGraph {
    pub fn new(noise: NoiseBuffer) -> Self {
        Self {
            osc: Oscillator::new(),
            noise_player: NoisePlayer::default(),
            noise,
            env: DecayEnvelope::new(),
        }
    }
}

impl GraphNode for NoteGraph {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            if !self.env.is_active() {
                *sample = 0.0;
                continue;
            }
            let source = match ctx.timbre {
                Timbre::Noise => self.noise_player.next_sample(&self.noise),
                timbre => self.osc.next_sample(timbre, ctx.frequency, ctx.sample_rate),
            };
            *sample = source * self.env.next_sample();
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.osc.reset();
        self.noise_player = NoisePlayer::start(ctx.note);
        self.env.trigger(ctx.gain, ctx.duration, ctx.sample_rate);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

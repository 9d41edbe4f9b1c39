use crate::graph::node::{GraphNode, RenderCtx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,    // Available for allocation
    Pending, // Allocated, waiting for its start frame inside the current block
    Active,  // Envelope decaying
}

/// A single pool slot that can play any GraphNode
pub struct SynthVoice<T: GraphNode> {
    state: VoiceState,
    age: u64,
    /// Frames into the next rendered block before the note starts.
    offset: usize,
    ctx: Option<RenderCtx>,
    graph: T,
}

impl<T: GraphNode> SynthVoice<T> {
    pub fn new(graph: T) -> Self {
        Self {
            state: VoiceState::Free,
            age: 0,
            offset: 0,
            ctx: None,
            graph,
        }
    }

    /// Claim the voice for a note that starts `offset` frames into the next block.
    pub fn start(&mut self, ctx: RenderCtx, offset: usize, age: u64) {
        self.state = VoiceState::Pending;
        self.age = age;
        self.offset = offset;
        self.ctx = Some(ctx);
    }

    /// Render into `out`, overwriting it. Frames before the start offset are silent.
    pub fn render(&mut self, out: &mut [f32]) {
        let Some(ctx) = self.ctx else {
            out.fill(0.0);
            return;
        };

        let mut start = 0;
        if self.state == VoiceState::Pending {
            start = self.offset.min(out.len());
            out[..start].fill(0.0);
            if start == out.len() {
                self.offset -= start;
                return;
            }
            self.graph.note_on(&ctx);
            self.state = VoiceState::Active;
            self.offset = 0;
        }

        self.graph.render_block(&mut out[start..], &ctx);

        if !self.graph.is_active() {
            self.free();
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Pending | VoiceState::Active)
    }

    pub fn get_envelope_level(&self) -> Option<f32> {
        self.graph.get_envelope_level()
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.ctx = None;
        self.offset = 0;
    }

    pub fn note(&self) -> Option<u8> {
        self.ctx.map(|ctx| ctx.note)
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}

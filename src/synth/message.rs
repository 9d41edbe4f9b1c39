#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::profile::BitMode;
use crate::sequencing::composition::NoteEvent;

/// Control messages from the tick thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChainCommand {
    Note(NoteEvent),
    SetBitMode(BitMode),
    /// Drop every pending and sounding note and clear effect tails.
    Silence,
}

pub trait CommandReceiver {
    fn pop(&mut self) -> Option<ChainCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for Consumer<ChainCommand> {
    fn pop(&mut self) -> Option<ChainCommand> {
        Consumer::pop(self).ok()
    }
}

/// Test and offline receiver backed by a plain queue.
impl CommandReceiver for std::collections::VecDeque<ChainCommand> {
    fn pop(&mut self) -> Option<ChainCommand> {
        self.pop_front()
    }
}

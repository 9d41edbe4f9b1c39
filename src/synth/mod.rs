// Purpose: Voice management and the command path into the signal chain
// This layer sits above graph nodes and manages the note voices

pub mod message;
pub mod poly;
pub mod voice;

pub use message::{ChainCommand, CommandReceiver};
pub use poly::VoicePool;

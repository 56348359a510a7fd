use rand::Rng;
use rand::seq::SliceRandom;

use super::conversation_state::Message;

pub const GREETINGS: [&str; 3] = [
    "Hi! I'm your interior design assistant. Tell me about the room you're furnishing.",
    "Hello! Looking for furniture ideas? Ask me about styles, layouts or specific products.",
    "Welcome! Describe your space and I'll suggest pieces that fit it.",
];

/// Picks the opening assistant message for a new session.
pub fn init<R: Rng + ?Sized>(rng: &mut R) -> Message {
    let text = GREETINGS.choose(rng).copied().unwrap_or(GREETINGS[0]);
    Message::greeting(text)
}

// src/client/mod.rs
// Library-level chat client: the browser-side interaction logic
// (composer state machine, staged attachment, progressive render buffer)
// as an explicitly-owned session object, plus the transport that drives
// one turn over HTTP.

pub mod session;
pub mod transport;

pub use session::{ChatSession, ComposerState, GENERIC_TURN_ERROR};
pub use transport::send_turn;

//! # Jockey Playback Controller (jockey-bot)
//!
//! Coordinates one playback session per chat room against an external
//! audio-streaming node.
//!
//! **Purpose:** translate chat commands into playback operations, advance
//! per-room queues on completion events, and report state back into chat
//! as structured reply payloads.
//!
//! **Architecture:** actor per room session; the chat gateway and the
//! audio node are external collaborators reached through the `Notifier`
//! and `AudioNode` capability traits.

pub mod api;
pub mod error;
pub mod node;
pub mod notify;
pub mod queue;
pub mod router;
pub mod session;

pub use error::{Error, Result};

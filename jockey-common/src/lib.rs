//! # Jockey Common Library
//!
//! Shared code for the jockey playback controller and the processes it
//! talks to, including:
//! - Wire types for the command ingress (requests in, reply payloads out)
//! - Audio node event types
//! - Track references and id newtypes
//! - Display-time formatting helpers
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod reply;
pub mod time;
pub mod track;

pub use error::{Error, Result};
pub use ids::{ChannelId, LinkId, RoomId};
pub use reply::Reply;
pub use track::TrackRef;

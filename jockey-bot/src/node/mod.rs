//! Audio node capability
//!
//! The controller never touches audio itself; it drives an external
//! streaming node through this trait. Sessions depend on the trait, not on
//! the REST implementation, so tests can substitute a scripted node.

pub mod rest;

use async_trait::async_trait;
use jockey_common::{ChannelId, LinkId, RoomId, TrackRef};
use thiserror::Error;

pub use rest::RestNode;

/// Failure classes the session logic reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeErrorKind {
    /// Connect did not complete within the configured bound
    Timeout,

    /// Node unreachable or refused the operation
    Unreachable,

    /// The link handle is no longer valid on the node
    InvalidLink,

    /// Node answered with something the adapter could not interpret
    Protocol,
}

/// Error from an audio node operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NodeError {
    pub kind: NodeErrorKind,
    pub message: String,
}

impl NodeError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: NodeErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            kind: NodeErrorKind::Unreachable,
            message: message.into(),
        }
    }

    pub fn invalid_link(message: impl Into<String>) -> Self {
        Self {
            kind: NodeErrorKind::InvalidLink,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            kind: NodeErrorKind::Protocol,
            message: message.into(),
        }
    }

    /// True when the link this operation used is dead on the node side.
    pub fn is_invalid_link(&self) -> bool {
        self.kind == NodeErrorKind::InvalidLink
    }
}

/// Convenience Result type for node operations
pub type NodeResult<T> = std::result::Result<T, NodeError>;

/// Operations the controller requires from the external audio node.
///
/// All operations are potentially slow network calls; they run inside the
/// issuing session's serialized lane and must never be called while holding
/// registry-wide locks.
#[async_trait]
pub trait AudioNode: Send + Sync {
    /// Establish a room link joined to the given voice channel.
    async fn connect(&self, room: RoomId, channel: ChannelId) -> NodeResult<LinkId>;

    /// Re-target an existing link to a different voice channel in the
    /// same room.
    async fn move_to(&self, link: LinkId, channel: ChannelId) -> NodeResult<()>;

    /// Search for playable tracks. Candidates are ordered best-first;
    /// an empty result means the query matched nothing.
    async fn resolve(&self, query: &str) -> NodeResult<Vec<TrackRef>>;

    /// Begin streaming a track on the link. The node later emits a
    /// `TrackEnded` event for it, whether it completes or is stopped.
    async fn start(&self, link: LinkId, track: &TrackRef) -> NodeResult<()>;

    /// Force-stop whatever the link is currently rendering.
    async fn stop(&self, link: LinkId) -> NodeResult<()>;

    /// Pause or unpause the link's current track.
    async fn set_paused(&self, link: LinkId, paused: bool) -> NodeResult<()>;

    /// Playback position of the current track, in milliseconds. Only
    /// valid while a track is active on the link.
    async fn position_ms(&self, link: LinkId) -> NodeResult<u64>;

    /// Release the room link. The handle is invalid afterwards.
    async fn disconnect(&self, link: LinkId) -> NodeResult<()>;
}

//! Event types pushed by the audio node
//!
//! The node delivers one event per terminated track over its event stream.
//! Events are link-scoped and arrive in FIFO order per link.

use crate::ids::{LinkId, RoomId};
use crate::track::TrackRef;
use serde::{Deserialize, Serialize};

/// Asynchronous event emitted by the audio node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// A track stopped rendering, either by reaching its end or by being
    /// force-stopped. Backend-side playback failures surface as the same
    /// event; the controller does not distinguish them.
    TrackEnded {
        link: LinkId,
        room: RoomId,
        track: TrackRef,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl NodeEvent {
    /// The room whose session must process this event.
    pub fn room(&self) -> RoomId {
        match self {
            NodeEvent::TrackEnded { room, .. } => *room,
        }
    }
}

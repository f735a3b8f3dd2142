//! Track references
//!
//! A track reference is the immutable descriptor of one playable item as
//! resolved by the audio node's search. It carries no identity beyond its
//! value; the node re-derives everything else from the locator.

use serde::{Deserialize, Serialize};

/// Immutable descriptor of a resolved playable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Display title
    pub title: String,

    /// Total length in milliseconds
    pub duration_ms: u64,

    /// Opaque source locator understood by the audio node
    pub locator: String,
}

impl TrackRef {
    pub fn new(
        title: impl Into<String>,
        duration_ms: u64,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            duration_ms,
            locator: locator.into(),
        }
    }
}

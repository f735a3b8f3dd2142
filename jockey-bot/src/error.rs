//! Error types for jockey-bot
//!
//! Defines the command error taxonomy using thiserror. Every command error
//! converts into a user-facing reply at the session boundary; nothing here
//! propagates out of a session actor.

use crate::node::NodeError;
use jockey_common::Reply;
use thiserror::Error;

/// How much of an underlying connect failure is shown to the user.
const CAUSE_DISPLAY_LIMIT: usize = 100;

/// Main error type for jockey-bot command handling
#[derive(Error, Debug)]
pub enum Error {
    /// Caller has no voice presence in the room
    #[error("caller is not in a voice channel")]
    NotInVoice,

    /// Command requires an existing room link, none exists
    #[error("no active session for this room")]
    NoActiveSession,

    /// Room connect did not complete within the bound
    #[error("connection to voice channel timed out")]
    ConnectionTimeout,

    /// Room connect or join failed outright
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Search produced no candidates
    #[error("no results for query: {0}")]
    NoResults(String),

    /// Operation is not valid in the current playback state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Audio node operation failed
    #[error("audio node error: {0}")]
    Node(#[from] NodeError),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration errors surfaced during wiring
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience Result type using jockey-bot Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Convert into the short-lived reply shown to the user.
    pub fn into_reply(self) -> Reply {
        match self {
            Error::NotInVoice => Reply::error("You're not in a voice channel"),
            Error::NoActiveSession => Reply::error("Bot is not in a voice channel"),
            Error::ConnectionTimeout => Reply::error(
                "Could not connect to voice channel (timeout). Please try again.",
            ),
            Error::ConnectionFailed(cause) => {
                let shown: String = cause.chars().take(CAUSE_DISPLAY_LIMIT).collect();
                Reply::error(format!("Failed to connect: {}", shown))
            }
            Error::NoResults(_) => Reply::error("Could not find that song"),
            Error::InvalidState(what) => Reply::error(what.to_string()),
            Error::Node(e) => Reply::error(format!("Playback error: {}", e)),
            Error::Http(e) => Reply::error(format!("Internal error: {}", e)),
            Error::Config(e) => Reply::error(format!("Internal error: {}", e)),
        }
    }
}

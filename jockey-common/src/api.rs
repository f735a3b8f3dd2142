//! Command ingress wire types
//!
//! The chat gateway forwards each inbound chat command as one HTTP request;
//! the response body is the `Reply` payload to render back into chat.

use crate::ids::{ChannelId, RoomId};
use serde::{Deserialize, Serialize};

/// One chat command forwarded by the gateway.
///
/// `text` is the command line with the gateway's prefix already stripped,
/// e.g. `play dark necessities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Room the command was issued in
    pub room_id: RoomId,

    /// Text channel the command was typed in (replies go there)
    pub text_channel_id: ChannelId,

    /// Voice channel the author is currently joined to, if any
    #[serde(default)]
    pub voice_channel_id: Option<ChannelId>,

    /// Display handle of the author, used in confirmations
    pub author: String,

    /// The command line, prefix stripped
    pub text: String,

    /// Gateway-measured websocket latency, echoed by `ping`
    #[serde(default)]
    pub gateway_latency_ms: Option<u64>,
}

//! REST adapter for the audio node
//!
//! Control operations go over the node's HTTP API; completion events come
//! back on its SSE stream. One adapter instance serves every session.

use crate::error::{Error, Result};
use crate::node::{AudioNode, NodeError, NodeResult};
use async_trait::async_trait;
use futures::StreamExt;
use jockey_common::events::NodeEvent;
use jockey_common::{ChannelId, LinkId, RoomId, TrackRef};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Delay before re-opening a dropped event stream.
const EVENT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Overall request timeout for control calls other than connect.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ConnectRequest {
    room_id: RoomId,
    voice_channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    link_id: LinkId,
}

#[derive(Debug, Serialize)]
struct MoveRequest {
    voice_channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    tracks: Vec<TrackRef>,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    track: &'a TrackRef,
}

#[derive(Debug, Serialize)]
struct PauseRequest {
    paused: bool,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    position_ms: u64,
}

/// Audio node client over its REST control API.
pub struct RestNode {
    http: reqwest::Client,
    base: String,
    password: Option<String>,
    connect_timeout: Duration,
}

impl RestNode {
    pub fn new(
        base_url: impl Into<String>,
        password: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base: base_url.into().trim_end_matches('/').to_string(),
            password,
            connect_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.password {
            Some(password) => request.header("Authorization", password),
            None => request,
        }
    }

    /// Map a transport-level failure onto the node error taxonomy.
    fn transport_error(e: reqwest::Error) -> NodeError {
        if e.is_timeout() {
            NodeError::timeout(format!("audio node request timed out: {}", e))
        } else if e.is_connect() {
            NodeError::unreachable(format!("audio node unreachable: {}", e))
        } else {
            NodeError::protocol(format!("audio node request failed: {}", e))
        }
    }

    /// Map a non-success HTTP status onto the node error taxonomy.
    ///
    /// The node answers 404/410 on any operation against a link it no
    /// longer holds; that is the stale-link signal sessions react to.
    fn status_error(status: StatusCode) -> NodeError {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                NodeError::invalid_link(format!("link not known to node ({})", status))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                NodeError::timeout(format!("audio node timed out ({})", status))
            }
            s => NodeError::unreachable(format!("audio node refused operation ({})", s)),
        }
    }

    async fn check(response: reqwest::Response) -> NodeResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::status_error(response.status()))
        }
    }

    /// Consume the node's SSE event stream, forwarding parsed events.
    ///
    /// Runs until the process stops or every receiver is gone; a dropped
    /// stream is re-opened after a fixed delay.
    pub async fn run_event_pump(&self, events: mpsc::Sender<NodeEvent>) {
        info!("Starting audio node event pump");
        loop {
            match self.stream_events(&events).await {
                Ok(()) => {
                    debug!("Event receiver closed, stopping pump");
                    return;
                }
                Err(e) => {
                    warn!("Audio node event stream dropped: {}", e);
                }
            }
            tokio::time::sleep(EVENT_RECONNECT_DELAY).await;
        }
    }

    /// One pass over the event stream. Ok(()) means the receiver side
    /// closed; Err means the stream itself failed and should be re-opened.
    async fn stream_events(&self, events: &mpsc::Sender<NodeEvent>) -> NodeResult<()> {
        let response = self
            .authorize(self.http.get(self.url("/v1/events")))
            .timeout(Duration::from_secs(24 * 3600))
            .send()
            .await
            .map_err(Self::transport_error)?;
        let response = Self::check(response).await?;

        info!("Connected to audio node event stream");

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Self::transport_error)?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            for event in drain_events(&mut buffer) {
                if events.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }

        Err(NodeError::unreachable("event stream ended"))
    }
}

/// Pull complete SSE lines out of `buffer` and parse their data payloads.
///
/// Non-data lines (comments, event names, keep-alives) are discarded;
/// unparseable payloads are logged and skipped rather than killing the
/// stream.
fn drain_events(buffer: &mut String) -> Vec<NodeEvent> {
    let mut events = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim_end_matches(['\n', '\r']);

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };

        match serde_json::from_str::<NodeEvent>(data.trim()) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Discarding malformed node event: {}", e),
        }
    }

    events
}

#[async_trait]
impl AudioNode for RestNode {
    async fn connect(&self, room: RoomId, channel: ChannelId) -> NodeResult<LinkId> {
        let request = self
            .authorize(self.http.post(self.url("/v1/links")))
            .json(&ConnectRequest {
                room_id: room,
                voice_channel_id: channel,
            })
            .send();

        // Bounded as a whole: a node that accepts the request but never
        // finishes the voice join still surfaces as a timeout.
        let response = tokio::time::timeout(self.connect_timeout, request)
            .await
            .map_err(|_| NodeError::timeout("voice connect timed out"))?
            .map_err(Self::transport_error)?;

        let response = Self::check(response).await?;
        let body: ConnectResponse = response
            .json()
            .await
            .map_err(|e| NodeError::protocol(format!("bad connect response: {}", e)))?;

        debug!("Connected room {} as link {}", room, body.link_id);
        Ok(body.link_id)
    }

    async fn move_to(&self, link: LinkId, channel: ChannelId) -> NodeResult<()> {
        let response = self
            .authorize(
                self.http
                    .patch(self.url(&format!("/v1/links/{}/channel", link))),
            )
            .json(&MoveRequest {
                voice_channel_id: channel,
            })
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response).await.map(|_| ())
    }

    async fn resolve(&self, query: &str) -> NodeResult<Vec<TrackRef>> {
        let response = self
            .authorize(self.http.get(self.url("/v1/tracks")))
            .query(&[("query", query)])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check(response).await?;
        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| NodeError::protocol(format!("bad resolve response: {}", e)))?;

        Ok(body.tracks)
    }

    async fn start(&self, link: LinkId, track: &TrackRef) -> NodeResult<()> {
        let response = self
            .authorize(
                self.http
                    .post(self.url(&format!("/v1/links/{}/player", link))),
            )
            .json(&StartRequest { track })
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response).await.map(|_| ())
    }

    async fn stop(&self, link: LinkId) -> NodeResult<()> {
        let response = self
            .authorize(
                self.http
                    .delete(self.url(&format!("/v1/links/{}/player", link))),
            )
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response).await.map(|_| ())
    }

    async fn set_paused(&self, link: LinkId, paused: bool) -> NodeResult<()> {
        let response = self
            .authorize(
                self.http
                    .patch(self.url(&format!("/v1/links/{}/player", link))),
            )
            .json(&PauseRequest { paused })
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response).await.map(|_| ())
    }

    async fn position_ms(&self, link: LinkId) -> NodeResult<u64> {
        let response = self
            .authorize(
                self.http
                    .get(self.url(&format!("/v1/links/{}/player/position", link))),
            )
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check(response).await?;
        let body: PositionResponse = response
            .json()
            .await
            .map_err(|e| NodeError::protocol(format!("bad position response: {}", e)))?;

        Ok(body.position_ms)
    }

    async fn disconnect(&self, link: LinkId) -> NodeResult<()> {
        let response = self
            .authorize(self.http.delete(self.url(&format!("/v1/links/{}", link))))
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeErrorKind;

    fn ended_json() -> String {
        let event = NodeEvent::TrackEnded {
            link: LinkId::new(),
            room: RoomId(7),
            track: TrackRef::new("Californication", 329_000, "yt:cali"),
            timestamp: chrono::Utc::now(),
        };
        serde_json::to_string(&event).unwrap()
    }

    #[test]
    fn test_drain_events_parses_data_lines() {
        let mut buffer = format!("data: {}\n", ended_json());
        let events = drain_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].room(), RoomId(7));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_events_keeps_partial_line() {
        let json = ended_json();
        let (head, tail) = json.split_at(10);

        let mut buffer = format!("data: {}", head);
        assert!(drain_events(&mut buffer).is_empty());

        buffer.push_str(tail);
        buffer.push('\n');
        assert_eq!(drain_events(&mut buffer).len(), 1);
    }

    #[test]
    fn test_drain_events_skips_comments_and_noise() {
        let mut buffer = format!(
            ": heartbeat\r\nevent: TrackEnded\r\ndata: {}\r\n\r\n",
            ended_json()
        );
        let events = drain_events(&mut buffer);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_drain_events_survives_malformed_payload() {
        let mut buffer = format!("data: {{not json}}\ndata: {}\n", ended_json());
        let events = drain_events(&mut buffer);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_status_mapping() {
        assert!(RestNode::status_error(StatusCode::NOT_FOUND).is_invalid_link());
        assert!(RestNode::status_error(StatusCode::GONE).is_invalid_link());
        assert_eq!(
            RestNode::status_error(StatusCode::GATEWAY_TIMEOUT).kind,
            NodeErrorKind::Timeout
        );
        assert_eq!(
            RestNode::status_error(StatusCode::INTERNAL_SERVER_ERROR).kind,
            NodeErrorKind::Unreachable
        );
    }
}

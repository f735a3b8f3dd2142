//! Shared test helpers
//!
//! A scripted audio node and a recording notifier, so session behavior can
//! be asserted through the calls it makes and the replies it produces.

#![allow(dead_code)]

use async_trait::async_trait;
use jockey_bot::node::{AudioNode, NodeError, NodeResult};
use jockey_bot::notify::Notifier;
use jockey_bot::session::CommandContext;
use jockey_common::events::NodeEvent;
use jockey_common::{ChannelId, LinkId, Reply, Result, RoomId, TrackRef};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default duration for tracks minted by the mock resolver (3:30).
pub const MOCK_TRACK_MS: u64 = 210_000;

/// Scripted audio node.
///
/// Records every operation as a string (`"start:song a"`), serves scripted
/// resolve results, and can fail the next occurrence of a named operation.
pub struct MockNode {
    calls: Mutex<Vec<String>>,
    resolve_scripts: Mutex<HashMap<String, Vec<TrackRef>>>,
    failures: Mutex<HashMap<&'static str, NodeError>>,
    position_ms: Mutex<u64>,
}

impl MockNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            resolve_scripts: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            position_ms: Mutex::new(0),
        })
    }

    /// Script the candidate list for a query. Unscripted queries resolve
    /// to a single track derived from the query text (see `track`).
    pub fn script_resolve(&self, query: &str, tracks: Vec<TrackRef>) {
        self.resolve_scripts
            .lock()
            .unwrap()
            .insert(query.to_string(), tracks);
    }

    /// Fail the next occurrence of `op` ("connect", "move", "resolve",
    /// "start", "stop", "pause", "position", "disconnect").
    pub fn fail_next(&self, op: &'static str, error: NodeError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    pub fn set_position(&self, ms: u64) {
        *self.position_ms.lock().unwrap() = ms;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self, op: &'static str) -> Option<NodeError> {
        self.failures.lock().unwrap().remove(op)
    }
}

#[async_trait]
impl AudioNode for MockNode {
    async fn connect(&self, room: RoomId, channel: ChannelId) -> NodeResult<LinkId> {
        self.record(format!("connect:{}:{}", room, channel));
        if let Some(e) = self.take_failure("connect") {
            return Err(e);
        }
        Ok(LinkId::new())
    }

    async fn move_to(&self, _link: LinkId, channel: ChannelId) -> NodeResult<()> {
        self.record(format!("move:{}", channel));
        if let Some(e) = self.take_failure("move") {
            return Err(e);
        }
        Ok(())
    }

    async fn resolve(&self, query: &str) -> NodeResult<Vec<TrackRef>> {
        self.record(format!("resolve:{}", query));
        if let Some(e) = self.take_failure("resolve") {
            return Err(e);
        }
        let scripted = self.resolve_scripts.lock().unwrap().get(query).cloned();
        Ok(scripted.unwrap_or_else(|| vec![track(query)]))
    }

    async fn start(&self, _link: LinkId, started: &TrackRef) -> NodeResult<()> {
        self.record(format!("start:{}", started.title));
        if let Some(e) = self.take_failure("start") {
            return Err(e);
        }
        Ok(())
    }

    async fn stop(&self, _link: LinkId) -> NodeResult<()> {
        self.record("stop".to_string());
        if let Some(e) = self.take_failure("stop") {
            return Err(e);
        }
        Ok(())
    }

    async fn set_paused(&self, _link: LinkId, paused: bool) -> NodeResult<()> {
        self.record(format!("pause:{}", paused));
        if let Some(e) = self.take_failure("pause") {
            return Err(e);
        }
        Ok(())
    }

    async fn position_ms(&self, _link: LinkId) -> NodeResult<u64> {
        self.record("position".to_string());
        if let Some(e) = self.take_failure("position") {
            return Err(e);
        }
        Ok(*self.position_ms.lock().unwrap())
    }

    async fn disconnect(&self, _link: LinkId) -> NodeResult<()> {
        self.record("disconnect".to_string());
        if let Some(e) = self.take_failure("disconnect") {
            return Err(e);
        }
        Ok(())
    }
}

/// Notifier that records deliveries instead of sending them anywhere.
pub struct MockNotifier {
    notices: Mutex<Vec<(ChannelId, Reply)>>,
    presence: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notices: Mutex::new(Vec::new()),
            presence: Mutex::new(Vec::new()),
        })
    }

    pub fn notices(&self) -> Vec<(ChannelId, Reply)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn presence_updates(&self) -> Vec<String> {
        self.presence.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, channel: ChannelId, reply: &Reply) -> Result<()> {
        self.notices.lock().unwrap().push((channel, reply.clone()));
        Ok(())
    }

    async fn set_presence(&self, text: &str) -> Result<()> {
        self.presence.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// The track the mock resolver mints for a query.
pub fn track(title: &str) -> TrackRef {
    TrackRef::new(title, MOCK_TRACK_MS, format!("mock:{}", title))
}

/// Command context for a caller joined to voice channel 100.
pub fn ctx() -> CommandContext {
    CommandContext {
        voice_channel: Some(ChannelId(100)),
        text_channel: ChannelId(200),
        author: "tester".to_string(),
    }
}

/// Command context for a caller with no voice presence.
pub fn ctx_no_voice() -> CommandContext {
    CommandContext {
        voice_channel: None,
        text_channel: ChannelId(200),
        author: "tester".to_string(),
    }
}

/// A TrackEnded event for the given room, as the node would emit it.
pub fn ended(room: RoomId, ended_track: TrackRef) -> NodeEvent {
    NodeEvent::TrackEnded {
        link: LinkId::new(),
        room,
        track: ended_track,
        timestamp: chrono::Utc::now(),
    }
}

/// Poll until `predicate` holds or the deadline passes.
pub async fn wait_until(predicate: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}

/// Give the actor time to drain already-delivered messages.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

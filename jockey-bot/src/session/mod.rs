//! Per-room playback session
//!
//! One session actor per chat room. The actor owns the queue, the current
//! track, the loop flag, and the room's audio-node link, and processes its
//! inbox one message at a time: commands (each carrying a reply slot) and
//! node completion events share the same lane, which is what serializes a
//! `skip` against an in-flight `TrackEnded` for the same room. Different
//! rooms never wait on each other.

pub mod registry;

use crate::error::{Error, Result};
use crate::node::{AudioNode, NodeError, NodeErrorKind};
use crate::notify::Notifier;
use crate::queue::TrackQueue;
use jockey_common::events::NodeEvent;
use jockey_common::reply::{EXPIRY_CONFIRM_SECS, EXPIRY_QUEUE_SECS};
use jockey_common::time::{format_track_time, progress_line};
use jockey_common::{ChannelId, LinkId, Reply, RoomId, TrackRef};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Upcoming tracks shown in a queue listing; the queue itself is unbounded.
const QUEUE_DISPLAY_LIMIT: usize = 25;

/// Inbox depth per session. Commands block the caller when a room's lane
/// is saturated; events are dropped (the node re-syncs on the next
/// operation).
const INBOX_CAPACITY: usize = 32;

/// Playback state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Per-command context forwarded by the router.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Voice channel the author is joined to, if any
    pub voice_channel: Option<ChannelId>,

    /// Text channel to use for asynchronous notifications
    pub text_channel: ChannelId,

    /// Author handle, shown in confirmations
    pub author: String,
}

/// Command-shaped operations a session executes.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Play { query: String },
    Skip,
    Pause,
    Resume,
    ShowQueue,
    ToggleLoop,
    NowPlaying,
    Leave,
}

enum SessionMessage {
    Command {
        command: SessionCommand,
        ctx: CommandContext,
        reply: oneshot::Sender<Reply>,
    },
    Event(NodeEvent),
}

/// Cheap handle to a session actor's inbox.
#[derive(Clone)]
pub struct SessionHandle {
    room: RoomId,
    tx: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Execute a command in the session's lane and wait for its reply.
    /// Returns None when the actor has terminated.
    pub async fn command(&self, command: SessionCommand, ctx: CommandContext) -> Option<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionMessage::Command {
                command,
                ctx,
                reply: reply_tx,
            })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    /// Deliver a node event into the session's lane without waiting.
    pub fn deliver(&self, event: NodeEvent) -> bool {
        self.tx.try_send(SessionMessage::Event(event)).is_ok()
    }

    /// True once the actor has exited (after `leave`).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The session actor's state.
///
/// Invariant between messages: `current.is_some()` exactly when
/// `playback` is `Playing` or `Paused`.
pub struct Session {
    room: RoomId,
    node: Arc<dyn AudioNode>,
    notifier: Arc<dyn Notifier>,

    queue: TrackQueue,
    current: Option<TrackRef>,
    playback: PlaybackState,
    loop_enabled: bool,

    link: Option<LinkId>,
    voice_channel: Option<ChannelId>,
    reply_channel: Option<ChannelId>,

    /// Force-stops issued whose `TrackEnded` echo has not arrived yet.
    pending_stops: u32,

    /// Set by a successful `leave`; the run loop exits after replying.
    closed: bool,
}

impl Session {
    /// Spawn the actor for a room and return a handle to its inbox.
    pub fn spawn(
        room: RoomId,
        node: Arc<dyn AudioNode>,
        notifier: Arc<dyn Notifier>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let session = Session {
            room,
            node,
            notifier,
            queue: TrackQueue::new(),
            current: None,
            playback: PlaybackState::Idle,
            loop_enabled: false,
            link: None,
            voice_channel: None,
            reply_channel: None,
            pending_stops: 0,
            closed: false,
        };
        tokio::spawn(session.run(rx));
        SessionHandle { room, tx }
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<SessionMessage>) {
        debug!("room {}: session started", self.room);
        while let Some(message) = inbox.recv().await {
            match message {
                SessionMessage::Command {
                    command,
                    ctx,
                    reply,
                } => {
                    let payload = self.handle_command(command, ctx).await;
                    let _ = reply.send(payload);
                    if self.closed {
                        break;
                    }
                }
                SessionMessage::Event(event) => self.handle_event(event).await,
            }
        }
        debug!("room {}: session terminated", self.room);
    }

    async fn handle_command(&mut self, command: SessionCommand, ctx: CommandContext) -> Reply {
        // Replies to later asynchronous notifications go wherever the
        // room last talked to us.
        self.reply_channel = Some(ctx.text_channel);

        let Some(voice) = ctx.voice_channel else {
            return Error::NotInVoice.into_reply();
        };

        let result = match command {
            SessionCommand::Play { query } => self.play(query, voice, &ctx.author).await,
            SessionCommand::Skip => self.skip().await,
            SessionCommand::Pause => self.pause().await,
            SessionCommand::Resume => self.resume().await,
            SessionCommand::ShowQueue => self.show_queue(),
            SessionCommand::ToggleLoop => self.toggle_loop(),
            SessionCommand::NowPlaying => self.now_playing().await,
            SessionCommand::Leave => self.leave().await,
        };

        result.unwrap_or_else(Error::into_reply)
    }

    // ----- command handlers -----

    async fn play(&mut self, query: String, voice: ChannelId, author: &str) -> Result<Reply> {
        let link = self.ensure_link(voice).await?;

        let resolved = self.node.resolve(&query).await;
        let candidates = resolved.map_err(Error::Node)?;
        let track = candidates
            .into_iter()
            .next()
            .ok_or(Error::NoResults(query))?;

        if self.current.is_some() {
            // Already rendering: append and report the queue position.
            self.queue.enqueue(track.clone());
            debug!(
                "room {}: queued \"{}\" at position {}",
                self.room,
                track.title,
                self.queue.len()
            );
            return Ok(Self::track_card("Queued", &track, author));
        }

        if !self.queue.is_empty() {
            // Idle with leftover queue (e.g. after a stale-link reset):
            // the new track joins the tail and the head plays first, so
            // insertion order stays play order.
            self.queue.enqueue(track.clone());
            if let Some(head) = self.queue.dequeue_next() {
                let started = self.node.start(link, &head).await;
                if let Err(e) = started {
                    return Err(self.map_link_failure(e));
                }
                debug!("room {}: resumed queue with \"{}\"", self.room, head.title);
                self.current = Some(head);
                self.playback = PlaybackState::Playing;
            }
            return Ok(Self::track_card("Queued", &track, author));
        }

        let started = self.node.start(link, &track).await;
        if let Err(e) = started {
            let mapped = self.map_link_failure(e);
            if !matches!(mapped, Error::NoActiveSession) {
                return Err(mapped);
            }
            // Stale link detected underneath us: reconnect once and retry.
            let link = self.ensure_link(voice).await?;
            let retried = self.node.start(link, &track).await;
            retried.map_err(Error::Node)?;
        }

        debug!("room {}: now playing \"{}\"", self.room, track.title);
        self.playback = PlaybackState::Playing;
        self.current = Some(track.clone());
        Ok(Self::track_card("Now Playing", &track, author))
    }

    async fn skip(&mut self) -> Result<Reply> {
        let link = self.link.ok_or(Error::NoActiveSession)?;
        let skipped = self
            .current
            .clone()
            .ok_or(Error::InvalidState("Nothing is playing"))?;

        let stopped = self.node.stop(link).await;
        if let Err(e) = stopped {
            return Err(self.map_link_failure(e));
        }

        // The node will echo a TrackEnded for the stopped track; the
        // counter makes the (skip, echo) pair advance exactly once.
        self.pending_stops += 1;

        // Forced advance: the loop flag only governs natural track end,
        // otherwise a looped track could never be skipped.
        self.advance(link).await?;

        Ok(Reply::titled("Song skipped", Some(EXPIRY_CONFIRM_SECS)).with_body(skipped.title))
    }

    async fn pause(&mut self) -> Result<Reply> {
        let link = self.link.ok_or(Error::NoActiveSession)?;
        if self.playback != PlaybackState::Playing {
            return Err(Error::InvalidState("Nothing is playing to pause"));
        }

        let paused = self.node.set_paused(link, true).await;
        if let Err(e) = paused {
            return Err(self.map_link_failure(e));
        }

        self.playback = PlaybackState::Paused;
        Ok(Reply::note("Paused"))
    }

    async fn resume(&mut self) -> Result<Reply> {
        let link = self.link.ok_or(Error::NoActiveSession)?;
        if self.playback != PlaybackState::Paused {
            return Err(Error::InvalidState("The track is not paused"));
        }

        let resumed = self.node.set_paused(link, false).await;
        if let Err(e) = resumed {
            return Err(self.map_link_failure(e));
        }

        self.playback = PlaybackState::Playing;
        Ok(Reply::note("Resumed"))
    }

    fn show_queue(&self) -> Result<Reply> {
        self.link.ok_or(Error::NoActiveSession)?;

        let mut reply = Reply::titled("Queue", Some(EXPIRY_QUEUE_SECS));

        if let Some(current) = &self.current {
            reply = reply.with_field(
                format!("***Now Playing*** - {}", current.title),
                format!("Duration: {}", format_track_time(current.duration_ms)),
            );
        }

        if self.queue.is_empty() {
            if self.current.is_none() {
                reply = reply.with_body("Queue is empty");
            }
        } else {
            for (index, track) in self.queue.peek_first(QUEUE_DISPLAY_LIMIT).enumerate() {
                reply = reply.with_field(
                    format!("{}. {}", index + 1, track.title),
                    format_track_time(track.duration_ms),
                );
            }
            if self.queue.len() > QUEUE_DISPLAY_LIMIT {
                reply = reply
                    .with_body(format!("And {} more...", self.queue.len() - QUEUE_DISPLAY_LIMIT));
            }
        }

        Ok(reply)
    }

    fn toggle_loop(&mut self) -> Result<Reply> {
        self.link.ok_or(Error::NoActiveSession)?;

        self.loop_enabled = !self.loop_enabled;
        Ok(Reply::note(if self.loop_enabled {
            "Loop **enabled**"
        } else {
            "Loop **disabled**"
        }))
    }

    async fn now_playing(&mut self) -> Result<Reply> {
        let link = self.link.ok_or(Error::NoActiveSession)?;
        let track = self
            .current
            .clone()
            .ok_or(Error::InvalidState("Nothing is playing"))?;

        let position = self.node.position_ms(link).await;
        let position_ms = match position {
            Ok(p) => p,
            Err(e) => return Err(self.map_link_failure(e)),
        };

        Ok(Reply::titled("Now Playing", Some(EXPIRY_CONFIRM_SECS))
            .with_body(track.title.clone())
            .with_field("Progress", progress_line(position_ms, track.duration_ms)))
    }

    async fn leave(&mut self) -> Result<Reply> {
        let link = self.link.ok_or(Error::NoActiveSession)?;

        let disconnected = self.node.disconnect(link).await;
        if let Err(e) = disconnected {
            return Err(self.map_link_failure(e));
        }

        self.queue.clear();
        self.current = None;
        self.playback = PlaybackState::Idle;
        self.link = None;
        self.voice_channel = None;
        self.closed = true;

        debug!("room {}: left voice, session closing", self.room);
        Ok(Reply::ephemeral("Disconnected"))
    }

    // ----- event handling -----

    async fn handle_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::TrackEnded { track, .. } => self.track_ended(track).await,
        }
    }

    async fn track_ended(&mut self, ended: TrackRef) {
        // Echo of a force-stop. Per-link events are FIFO, so the echo
        // always precedes any later natural completion; consuming it here
        // can never swallow an unrelated event.
        if self.pending_stops > 0 {
            self.pending_stops -= 1;
            return;
        }

        let Some(link) = self.link else {
            return;
        };
        let Some(current) = self.current.clone() else {
            return;
        };
        if current != ended {
            // Stale: refers to a track that is no longer active.
            return;
        }

        if self.loop_enabled {
            let restarted = self.node.start(link, &current).await;
            match restarted {
                Ok(()) => {
                    self.playback = PlaybackState::Playing;
                    self.notify_loop_replay(&current).await;
                }
                Err(e) => {
                    warn!("room {}: failed to restart looped track: {}", self.room, e);
                    self.fail_playback(e);
                }
            }
            return;
        }

        if let Err(e) = self.advance(link).await {
            warn!("room {}: failed to advance queue: {}", self.room, e);
        }
    }

    /// Advance to the next queued track, or go idle. Auto-advance is
    /// silent; only loop replays notify the room.
    async fn advance(&mut self, link: LinkId) -> Result<()> {
        match self.queue.dequeue_next() {
            Some(next) => {
                let started = self.node.start(link, &next).await;
                if let Err(e) = started {
                    let mapped = self.map_link_failure(e);
                    self.current = None;
                    self.playback = PlaybackState::Idle;
                    return Err(mapped);
                }
                debug!("room {}: advanced to \"{}\"", self.room, next.title);
                self.current = Some(next);
                self.playback = PlaybackState::Playing;
            }
            None => {
                debug!("room {}: queue drained, going idle", self.room);
                self.current = None;
                self.playback = PlaybackState::Idle;
            }
        }
        Ok(())
    }

    async fn notify_loop_replay(&self, track: &TrackRef) {
        let Some(channel) = self.reply_channel else {
            return;
        };
        let reply =
            Reply::titled("Looping", Some(EXPIRY_CONFIRM_SECS)).with_body(track.title.clone());
        if let Err(e) = self.notifier.notify(channel, &reply).await {
            debug!("room {}: loop notification failed: {}", self.room, e);
        }
    }

    // ----- link lifecycle -----

    /// Connect the room, or reuse/move the existing link.
    async fn ensure_link(&mut self, voice: ChannelId) -> Result<LinkId> {
        if let Some(link) = self.link {
            if self.voice_channel == Some(voice) {
                return Ok(link);
            }
            let moved = self.node.move_to(link, voice).await;
            match moved {
                Ok(()) => {
                    self.voice_channel = Some(voice);
                    return Ok(link);
                }
                Err(e) if e.is_invalid_link() => {
                    // Node dropped us without a leave; reconnect below.
                    self.reset_link();
                }
                Err(e) => return Err(connect_error(e)),
            }
        }

        let connected = self.node.connect(self.room, voice).await;
        let link = connected.map_err(connect_error)?;
        debug!("room {}: connected to voice channel {}", self.room, voice);
        self.link = Some(link);
        self.voice_channel = Some(voice);
        Ok(link)
    }

    /// A node call failed mid-command: on a dead link, reset to idle and
    /// report the session as gone; anything else passes through.
    fn map_link_failure(&mut self, e: NodeError) -> Error {
        if e.is_invalid_link() {
            warn!("room {}: stale link detected, resetting", self.room);
            self.reset_link();
            Error::NoActiveSession
        } else {
            Error::Node(e)
        }
    }

    /// Playback could not continue after a completion event.
    fn fail_playback(&mut self, e: NodeError) {
        if e.is_invalid_link() {
            self.reset_link();
        } else {
            self.current = None;
            self.playback = PlaybackState::Idle;
        }
    }

    /// Forget the link and everything only valid while it exists. The
    /// queue survives; a later `play` reconnects and resumes draining it.
    fn reset_link(&mut self) {
        self.link = None;
        self.voice_channel = None;
        self.current = None;
        self.playback = PlaybackState::Idle;
        self.pending_stops = 0;
    }

    // ----- reply builders -----

    fn track_card(title: &str, track: &TrackRef, author: &str) -> Reply {
        Reply::titled(title, Some(EXPIRY_CONFIRM_SECS))
            .with_field("Song", track.title.clone())
            .with_field("Duration", format_track_time(track.duration_ms))
            .with_field("By", author)
    }
}

fn connect_error(e: NodeError) -> Error {
    match e.kind {
        NodeErrorKind::Timeout => Error::ConnectionTimeout,
        _ => Error::ConnectionFailed(e.message),
    }
}

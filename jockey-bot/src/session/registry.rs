//! Session registry
//!
//! Process-wide map from room id to the room's session actor. Lookups on
//! different rooms never contend; creation is atomic per key, so two
//! first-touch commands racing for the same room get the same actor.

use crate::node::AudioNode;
use crate::notify::Notifier;
use crate::session::{Session, SessionHandle};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jockey_common::events::NodeEvent;
use jockey_common::RoomId;
use std::sync::Arc;
use tracing::debug;

/// Room → session map.
///
/// Entries are not proactively evicted: a `leave` terminates the actor and
/// the dead handle is reaped on the next lookup for that room.
pub struct SessionRegistry {
    node: Arc<dyn AudioNode>,
    notifier: Arc<dyn Notifier>,
    sessions: DashMap<RoomId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(node: Arc<dyn AudioNode>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            node,
            notifier,
            sessions: DashMap::new(),
        }
    }

    /// Return the room's session, creating an idle one if none is alive.
    pub fn get_or_create(&self, room: RoomId) -> SessionHandle {
        match self.sessions.entry(room) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_closed() {
                    debug!("room {}: replacing terminated session", room);
                    let handle = self.spawn_session(room);
                    occupied.insert(handle.clone());
                    handle
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                debug!("room {}: creating session", room);
                let handle = self.spawn_session(room);
                vacant.insert(handle.clone());
                handle
            }
        }
    }

    /// Non-creating lookup for read-only commands. A terminated actor
    /// counts as absent.
    pub fn get(&self, room: RoomId) -> Option<SessionHandle> {
        self.sessions
            .get(&room)
            .map(|entry| entry.value().clone())
            .filter(|handle| !handle.is_closed())
    }

    /// Route a node event into the owning session's lane. Events for
    /// rooms without a live session are stale and dropped.
    pub fn dispatch_event(&self, event: NodeEvent) {
        let room = event.room();
        match self.get(room) {
            Some(handle) => {
                if !handle.deliver(event) {
                    debug!("room {}: inbox full, dropping node event", room);
                }
            }
            None => debug!("room {}: dropping event for absent session", room),
        }
    }

    /// Number of rooms with a live session (status endpoint).
    pub fn active_rooms(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .count()
    }

    fn spawn_session(&self, room: RoomId) -> SessionHandle {
        Session::spawn(room, Arc::clone(&self.node), Arc::clone(&self.notifier))
    }
}

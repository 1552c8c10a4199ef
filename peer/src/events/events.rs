use std::{mem, vec::IntoIter};

use peerlink_shared::PeerId;

use crate::PeerLinkError;

/// Why a peer is no longer reachable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The transport closed the link
    Closed,
    /// Closed on this side through `disconnect`
    Local,
    /// The handshake never completed
    Failed,
    /// The peer left the group
    MemberLeft,
    /// The only route was a relay and relays are disabled
    RelayRefused,
}

/// Everything that happened since the last `receive` / `tick`
pub struct Events {
    connections: Vec<PeerId>,
    disconnections: Vec<(PeerId, DisconnectReason)>,
    requests: Vec<PeerId>,
    errors: Vec<PeerLinkError>,

    empty: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            requests: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, peer: &PeerId) {
        self.connections.push(peer.clone());
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, peer: &PeerId, reason: DisconnectReason) {
        self.disconnections.push((peer.clone(), reason));
        self.empty = false;
    }

    pub(crate) fn push_request(&mut self, peer: &PeerId) {
        self.requests.push(peer.clone());
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: PeerLinkError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<(PeerId, DisconnectReason)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// ConnectionRequestEvent, only raised when auto-accept is off
pub struct ConnectionRequestEvent;
impl Event for ConnectionRequestEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.requests);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.requests.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<PeerLinkError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}

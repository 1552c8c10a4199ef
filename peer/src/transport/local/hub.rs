use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use log::{debug, trace, warn};
use parking_lot::Mutex;

use peerlink_shared::{
    InboundPacket, LinkPath, Packet, PacketReliability, PeerId, TransportError, TransportEvent,
};

use super::{LinkConditionerConfig, LocalTransport};

/// Shared switchboard for [`LocalTransport`] endpoints.
///
/// Connections follow the same handshake as a real peer-to-peer service:
/// one side requests, the other accepts (explicitly, or because it accepts
/// everyone), and both sides then see `ConnectionEstablished`. Clones share
/// the same hub.
#[derive(Clone, Default)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub that applies `conditioner` to every packet
    pub fn with_conditioner(conditioner: LinkConditionerConfig) -> Self {
        let hub = Self::new();
        hub.set_conditioner(Some(conditioner));
        hub
    }

    /// Register `id` and return its transport. Re-registering an id replaces
    /// the previous endpoint.
    pub fn endpoint(&self, id: impl Into<PeerId>) -> LocalTransport {
        let id = id.into();
        let generation = self.state.lock().register(&id);
        LocalTransport::new(id, generation, self.state.clone())
    }

    pub fn set_conditioner(&self, conditioner: Option<LinkConditionerConfig>) {
        self.state.lock().conditioner = conditioner;
    }

    /// Links between `a` and `b` come up over a relay instead of directly
    pub fn force_relay(&self, a: &PeerId, b: &PeerId) {
        self.state.lock().relayed.insert(pair(a, b));
    }

    /// Drop the link between `a` and `b` as a network failure would: both
    /// sides see `ConnectionClosed`, or `ConnectionFailed` if the handshake
    /// was still in flight
    pub fn sever(&self, a: &PeerId, b: &PeerId) {
        let mut state = self.state.lock();
        state.drop_link(a, b);
        state.drop_link(b, a);
    }

    /// Put a raw packet in front of `peer`, bypassing every check. Lets tests
    /// simulate traffic from other namespaces or unknown senders.
    pub fn inject(&self, peer: &PeerId, inbound: InboundPacket) -> bool {
        match self.state.lock().endpoints.get_mut(peer) {
            Some(endpoint) => {
                endpoint.inbound.push_back(inbound);
                true
            }
            None => false,
        }
    }

    pub fn is_linked(&self, a: &PeerId, b: &PeerId) -> bool {
        self.state
            .lock()
            .endpoints
            .get(a)
            .map(|endpoint| endpoint.links.contains(b))
            .unwrap_or(false)
    }

    pub fn endpoint_count(&self) -> usize {
        self.state.lock().endpoints.len()
    }
}

#[derive(Default)]
pub(crate) struct Endpoint {
    generation: u64,
    namespace: Option<String>,
    accept_all: bool,
    accepted: HashSet<PeerId>,
    /// Peers we asked to connect to, still waiting on them
    outgoing: HashSet<PeerId>,
    /// Peers that asked us, still waiting on our accept
    requests: HashSet<PeerId>,
    links: HashSet<PeerId>,
    /// Packets sent while the handshake was in flight
    held: HashMap<PeerId, Vec<Packet>>,
    events: VecDeque<TransportEvent>,
    inbound: VecDeque<InboundPacket>,
}

impl Endpoint {
    fn accepts(&self, peer: &PeerId) -> bool {
        self.accept_all || self.accepted.contains(peer) || self.outgoing.contains(peer)
    }
}

#[derive(Default)]
pub(crate) struct HubState {
    next_generation: u64,
    endpoints: HashMap<PeerId, Endpoint>,
    relayed: HashSet<(PeerId, PeerId)>,
    conditioner: Option<LinkConditionerConfig>,
}

fn pair(a: &PeerId, b: &PeerId) -> (PeerId, PeerId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl HubState {
    fn register(&mut self, id: &PeerId) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(previous) = self.endpoints.get(id).map(|endpoint| endpoint.generation) {
            self.unregister(id, previous);
        }
        self.endpoints.insert(
            id.clone(),
            Endpoint {
                generation,
                ..Endpoint::default()
            },
        );
        generation
    }

    pub fn bind(&mut self, id: &PeerId, namespace: &str) -> Result<(), TransportError> {
        let Some(endpoint) = self.endpoints.get_mut(id) else {
            return Err(TransportError::NotBound);
        };
        if let Some(bound) = &endpoint.namespace {
            return Err(TransportError::AlreadyBound {
                namespace: bound.clone(),
            });
        }
        debug!("local hub: {} bound to '{}'", id, namespace);
        endpoint.namespace = Some(namespace.to_string());
        Ok(())
    }

    pub fn request(&mut self, from: &PeerId, to: &PeerId) -> Result<(), TransportError> {
        let namespace = self.namespace_of(from)?;
        let reachable = self
            .endpoints
            .get(to)
            .map(|endpoint| endpoint.namespace.as_deref() == Some(namespace.as_str()))
            .unwrap_or(false);
        if !reachable || from == to {
            return Err(TransportError::Unreachable {
                peer: to.to_string(),
            });
        }

        if let Some(endpoint) = self.endpoints.get_mut(from) {
            if endpoint.links.contains(to) {
                return Ok(());
            }
            endpoint.outgoing.insert(to.clone());
        }

        // the other side always hears about the request, even when it
        // already accepts it, so its session can start tracking us
        let accepted = match self.endpoints.get_mut(to) {
            Some(endpoint) => {
                if endpoint.requests.insert(from.clone()) {
                    trace!("local hub: {} asks {} to connect", from, to);
                    endpoint
                        .events
                        .push_back(TransportEvent::ConnectionRequested(from.clone()));
                }
                endpoint.accepts(from)
            }
            None => false,
        };
        if accepted {
            self.establish(from, to);
        }
        Ok(())
    }

    pub fn accept(&mut self, id: &PeerId, peer: Option<&PeerId>) {
        let waiting: Vec<PeerId> = {
            let Some(endpoint) = self.endpoints.get_mut(id) else {
                return;
            };
            match peer {
                Some(peer) => {
                    endpoint.accepted.insert(peer.clone());
                    if endpoint.requests.remove(peer) {
                        vec![peer.clone()]
                    } else {
                        Vec::new()
                    }
                }
                None => {
                    endpoint.accept_all = true;
                    endpoint.requests.drain().collect()
                }
            }
        };

        for requester in waiting {
            let still_waiting = self
                .endpoints
                .get(&requester)
                .map(|endpoint| endpoint.outgoing.contains(id))
                .unwrap_or(false);
            if still_waiting {
                self.establish(&requester, id);
            }
        }
    }

    /// Close our side of any link or handshake with `peer`
    pub fn close(&mut self, id: &PeerId, peer: &PeerId) {
        if let Some(endpoint) = self.endpoints.get_mut(id) {
            endpoint.outgoing.remove(peer);
            endpoint.requests.remove(peer);
            endpoint.links.remove(peer);
            endpoint.held.remove(peer);
        }
        self.drop_link(peer, id);
    }

    /// Tear down `id`'s side of its relationship with `peer` and tell it why
    pub fn drop_link(&mut self, id: &PeerId, peer: &PeerId) {
        let Some(endpoint) = self.endpoints.get_mut(id) else {
            return;
        };
        endpoint.requests.remove(peer);
        endpoint.held.remove(peer);
        if endpoint.links.remove(peer) {
            endpoint
                .events
                .push_back(TransportEvent::ConnectionClosed(peer.clone()));
        } else if endpoint.outgoing.remove(peer) {
            endpoint
                .events
                .push_back(TransportEvent::ConnectionFailed(peer.clone()));
        }
    }

    /// Remove `id` from the hub; everyone linked to it sees the link close
    pub fn unregister(&mut self, id: &PeerId, generation: u64) {
        let current = self.endpoints.get(id).map(|endpoint| endpoint.generation);
        if current != Some(generation) {
            return;
        }
        let Some(endpoint) = self.endpoints.remove(id) else {
            return;
        };
        let related: HashSet<PeerId> = endpoint
            .links
            .iter()
            .chain(endpoint.outgoing.iter())
            .chain(endpoint.requests.iter())
            .cloned()
            .collect();
        for peer in related {
            self.drop_link(&peer, id);
        }
        debug!("local hub: {} left", id);
    }

    pub fn send(
        &mut self,
        from: &PeerId,
        to: &PeerId,
        payload: &[u8],
        channel: u8,
        reliability: PacketReliability,
    ) -> Result<(), TransportError> {
        let namespace = self.namespace_of(from)?;
        let packet = Packet::incoming(from.clone(), payload, channel, reliability);

        let Some(endpoint) = self.endpoints.get_mut(from) else {
            return Err(TransportError::NotBound);
        };
        if endpoint.links.contains(to) {
            self.deliver(to, namespace, packet);
        } else if endpoint.outgoing.contains(to) || endpoint.requests.contains(to) {
            trace!("local hub: holding {} bytes until {} is linked", packet.len(), to);
            endpoint.held.entry(to.clone()).or_default().push(packet);
        } else {
            return Err(TransportError::SendFailed {
                peer: to.to_string(),
                len: payload.len(),
            });
        }
        Ok(())
    }

    pub fn poll_event(&mut self, id: &PeerId) -> Option<TransportEvent> {
        self.endpoints.get_mut(id)?.events.pop_front()
    }

    pub fn poll_inbound(&mut self, id: &PeerId) -> Option<InboundPacket> {
        self.endpoints.get_mut(id)?.inbound.pop_front()
    }

    fn namespace_of(&self, id: &PeerId) -> Result<String, TransportError> {
        self.endpoints
            .get(id)
            .and_then(|endpoint| endpoint.namespace.clone())
            .ok_or(TransportError::NotBound)
    }

    fn establish(&mut self, a: &PeerId, b: &PeerId) {
        let path = if self.relayed.contains(&pair(a, b)) {
            LinkPath::Relay
        } else {
            LinkPath::Direct
        };
        let round_trip = self.conditioner.map(|conditioner| conditioner.round_trip_ms);
        debug!("local hub: {} <-> {} established ({:?})", a, b, path);

        let mut held = Vec::new();
        for (this, other) in [(a, b), (b, a)] {
            if let Some(endpoint) = self.endpoints.get_mut(this) {
                endpoint.outgoing.remove(other);
                endpoint.requests.remove(other);
                endpoint.links.insert(other.clone());
                endpoint
                    .events
                    .push_back(TransportEvent::ConnectionEstablished(other.clone(), path));
                if let Some(round_trip) = round_trip {
                    endpoint
                        .events
                        .push_back(TransportEvent::RoundTrip(other.clone(), round_trip));
                }
                if let Some(packets) = endpoint.held.remove(other) {
                    held.push((other.clone(), packets));
                }
            }
        }

        for (to, packets) in held {
            for packet in packets {
                let Some(sender) = packet.sender().cloned() else {
                    continue;
                };
                match self.namespace_of(&sender) {
                    Ok(namespace) => self.deliver(&to, namespace, packet),
                    Err(_) => warn!("local hub: dropping held packet from unbound {}", sender),
                }
            }
        }
    }

    fn deliver(&mut self, to: &PeerId, namespace: String, packet: Packet) {
        let conditioner = self.conditioner;
        let Some(endpoint) = self.endpoints.get_mut(to) else {
            return;
        };
        let position = match conditioner {
            Some(conditioner) => {
                if conditioner.should_drop(packet.reliability()) {
                    trace!("local hub: lost {} bytes on the way to {}", packet.len(), to);
                    return;
                }
                conditioner.insert_position(packet.reliability(), endpoint.inbound.len())
            }
            None => endpoint.inbound.len(),
        };
        endpoint
            .inbound
            .insert(position, InboundPacket { namespace, packet });
    }
}

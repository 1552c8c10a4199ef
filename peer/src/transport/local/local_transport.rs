use std::sync::Arc;

use parking_lot::Mutex;

use peerlink_shared::{
    ChannelIndex, InboundPacket, PacketReliability, PeerId, Transport, TransportError,
    TransportEvent,
};

use super::hub::HubState;

/// One endpoint of a [`LocalHub`](super::LocalHub). Dropping it removes the
/// endpoint, and every peer linked to it sees the link close.
pub struct LocalTransport {
    id: PeerId,
    generation: u64,
    state: Arc<Mutex<HubState>>,
}

impl LocalTransport {
    pub(crate) fn new(id: PeerId, generation: u64, state: Arc<Mutex<HubState>>) -> Self {
        Self {
            id,
            generation,
            state,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }
}

impl Transport for LocalTransport {
    /// Relay policy is enforced by the session; the hub only decides the path
    fn bind(&mut self, namespace: &str, _allow_relay: bool) -> Result<(), TransportError> {
        self.state.lock().bind(&self.id, namespace)
    }

    fn request_connection(&mut self, peer: &PeerId) -> Result<(), TransportError> {
        self.state.lock().request(&self.id, peer)
    }

    fn accept_connection(&mut self, peer: Option<&PeerId>) {
        self.state.lock().accept(&self.id, peer);
    }

    fn close_connection(&mut self, peer: &PeerId) {
        self.state.lock().close(&self.id, peer);
    }

    fn raw_send(
        &mut self,
        peer: &PeerId,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Result<(), TransportError> {
        self.state
            .lock()
            .send(&self.id, peer, payload, channel, reliability)
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.state.lock().poll_event(&self.id)
    }

    fn poll_inbound(&mut self) -> Option<InboundPacket> {
        self.state.lock().poll_inbound(&self.id)
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        self.state.lock().unregister(&self.id, self.generation);
    }
}

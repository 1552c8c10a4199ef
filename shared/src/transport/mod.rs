pub mod error;

use crate::{ChannelIndex, LinkPath, Packet, PacketReliability, PeerId};

use self::error::TransportError;

/// Lifecycle notification from the transport, delivered in causal order per
/// peer: requested → established | failed → closed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    ConnectionRequested(PeerId),
    ConnectionEstablished(PeerId, LinkPath),
    ConnectionFailed(PeerId),
    ConnectionClosed(PeerId),
    RoundTrip(PeerId, u32),
}

/// A received packet along with the namespace it arrived on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundPacket {
    pub namespace: String,
    pub packet: Packet,
}

/// Peer-to-peer primitives a session drives. Every call returns immediately;
/// completion arrives later through `poll_event`.
pub trait Transport: Send {
    /// Scope all further traffic to `namespace`
    fn bind(&mut self, namespace: &str, allow_relay: bool) -> Result<(), TransportError>;

    fn request_connection(&mut self, peer: &PeerId) -> Result<(), TransportError>;

    /// Accept pending and future requests from `peer`, or from anyone
    fn accept_connection(&mut self, peer: Option<&PeerId>);

    fn close_connection(&mut self, peer: &PeerId);

    fn raw_send(
        &mut self,
        peer: &PeerId,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Result<(), TransportError>;

    fn poll_event(&mut self) -> Option<TransportEvent>;

    fn poll_inbound(&mut self) -> Option<InboundPacket>;
}

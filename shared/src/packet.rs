use crate::{ChannelIndex, PacketReliability, PeerId};

/// A single datagram moving through a session. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    sender: Option<PeerId>,
    channel: ChannelIndex,
    payload: Box<[u8]>,
    reliability: PacketReliability,
}

impl Packet {
    /// A packet that has not been sent yet, so has no sender
    pub fn outgoing(
        payload: impl Into<Box<[u8]>>,
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Self {
        Self {
            sender: None,
            channel,
            payload: payload.into(),
            reliability,
        }
    }

    /// A packet received from `sender`
    pub fn incoming(
        sender: PeerId,
        payload: impl Into<Box<[u8]>>,
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Self {
        Self {
            sender: Some(sender),
            channel,
            payload: payload.into(),
            reliability,
        }
    }

    pub fn sender(&self) -> Option<&PeerId> {
        self.sender.as_ref()
    }

    pub fn channel(&self) -> ChannelIndex {
        self.channel
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn reliability(&self) -> PacketReliability {
        self.reliability
    }
}

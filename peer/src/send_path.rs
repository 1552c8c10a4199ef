use std::sync::Arc;

use log::{trace, warn};

use peerlink_shared::{ChannelIndex, ConnectionStatus, PacketReliability, PeerId, SendError, Transport};

use crate::{ConnectionRegistry, Diagnostics};

/// Outcome counts of one broadcast. Informational only: a broadcast never
/// fails as a whole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Validates outgoing packets and hands them to the transport
pub(crate) struct SendPath {
    max_packet_size: usize,
    num_channels: u8,
    registry: Arc<ConnectionRegistry>,
    diagnostics: Arc<Diagnostics>,
}

impl SendPath {
    pub fn new(
        max_packet_size: usize,
        num_channels: u8,
        registry: Arc<ConnectionRegistry>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            max_packet_size,
            num_channels,
            registry,
            diagnostics,
        }
    }

    /// Checks that depend only on the packet itself
    pub fn validate_packet(&self, payload: &[u8], channel: ChannelIndex) -> Result<(), SendError> {
        if payload.is_empty() {
            return Err(SendError::EmptyPayload);
        }
        if payload.len() > self.max_packet_size {
            return Err(SendError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_packet_size,
            });
        }
        if channel >= self.num_channels {
            return Err(SendError::ChannelOutOfRange {
                channel,
                num_channels: self.num_channels,
            });
        }
        Ok(())
    }

    /// Connected and Connecting peers can be sent to. Packets for a peer that
    /// is still connecting are held by the transport until the link is up.
    fn validate_peer(&self, peer: &PeerId) -> Result<(), SendError> {
        if !peer.is_valid() {
            return Err(SendError::InvalidPeer);
        }
        match self.registry.status(peer) {
            ConnectionStatus::Connected | ConnectionStatus::Connecting => Ok(()),
            ConnectionStatus::Disconnected => Err(SendError::UnknownPeer {
                peer: peer.to_string(),
            }),
            status @ ConnectionStatus::Failed => Err(SendError::PeerNotConnected {
                peer: peer.to_string(),
                status,
            }),
        }
    }

    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        peer: &PeerId,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Result<(), SendError> {
        let checked = self
            .validate_packet(payload, channel)
            .and_then(|_| self.validate_peer(peer));
        if let Err(error) = checked {
            self.diagnostics.send_rejected();
            warn!("send to {} rejected: {}", peer, error);
            return Err(error);
        }

        if let Err(error) = transport.raw_send(peer, payload, channel, reliability) {
            self.diagnostics.transport_failure();
            warn!("transport refused {} bytes for {}: {}", payload.len(), peer, error);
            return Err(SendError::Transport(error));
        }

        self.registry.record_sent(peer, payload.len());
        self.diagnostics.send_delivered();
        trace!(
            "sent {} bytes to {} on channel {} ({:?})",
            payload.len(),
            peer,
            channel,
            reliability
        );
        Ok(())
    }

    /// Send to every peer Connected at the time of the call. Each send stands
    /// alone; failures are counted and skipped.
    pub fn broadcast<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> BroadcastReport {
        let peers = self.registry.connected_peers();
        let mut report = BroadcastReport::default();
        for peer in peers {
            report.attempted += 1;
            match self.send(transport, &peer, payload, channel, reliability) {
                Ok(()) => report.delivered += 1,
                Err(_) => report.failed += 1,
            }
        }
        report
    }
}

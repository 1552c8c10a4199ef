use std::{collections::VecDeque, sync::Arc};

use log::{trace, warn};
use parking_lot::Mutex;

use peerlink_shared::Packet;

use crate::{ConnectionRegistry, Diagnostics};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Admitted,
    /// The queue was full; its oldest packet was evicted to make room
    AdmittedDroppingOldest,
}

/// Bounded FIFO between the transport and the application's drain. Pushing
/// never blocks: at capacity the oldest packet gives way to the newest.
///
/// Clones share the same buffer.
#[derive(Clone)]
pub struct PacketQueue {
    packets: Arc<Mutex<VecDeque<Packet>>>,
    capacity: usize,
    diagnostics: Arc<Diagnostics>,
}

impl PacketQueue {
    pub fn with_capacity(capacity: usize, diagnostics: Arc<Diagnostics>) -> Self {
        let capacity = capacity.max(1);
        Self {
            packets: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
            diagnostics,
        }
    }

    pub fn push(&self, packet: Packet) -> PushOutcome {
        let evicted = {
            let mut packets = self.packets.lock();
            let evicted = if packets.len() >= self.capacity {
                packets.pop_front()
            } else {
                None
            };
            packets.push_back(packet);
            evicted
        };

        match evicted {
            Some(old) => {
                self.diagnostics.queue_overflow();
                warn!(
                    "inbound queue full ({} packets), dropped oldest packet from {:?}",
                    self.capacity,
                    old.sender()
                );
                PushOutcome::AdmittedDroppingOldest
            }
            None => PushOutcome::Admitted,
        }
    }

    /// Remove the oldest packet. The lock is released before this returns.
    pub fn pop(&self) -> Option<Packet> {
        self.packets.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) -> usize {
        let mut packets = self.packets.lock();
        let count = packets.len();
        packets.clear();
        count
    }
}

/// Producer handle for the inbound queue, safe to move onto a transport's
/// own event thread.
///
/// Packets from another namespace, packets outside the session's size and
/// channel limits, and packets from a peer with no connection record are
/// dropped before they reach the queue.
#[derive(Clone)]
pub struct InboundSender {
    namespace: Arc<str>,
    max_packet_size: usize,
    num_channels: u8,
    queue: PacketQueue,
    registry: Arc<ConnectionRegistry>,
    diagnostics: Arc<Diagnostics>,
}

impl InboundSender {
    pub(crate) fn new(
        namespace: Arc<str>,
        max_packet_size: usize,
        num_channels: u8,
        queue: PacketQueue,
        registry: Arc<ConnectionRegistry>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            namespace,
            max_packet_size,
            num_channels,
            queue,
            registry,
            diagnostics,
        }
    }

    /// Hand a received packet to the session. Returns whether it was queued.
    pub fn deliver(&self, namespace: &str, packet: Packet) -> bool {
        if namespace != &*self.namespace {
            trace!("dropping packet for foreign namespace '{}'", namespace);
            self.diagnostics.foreign_packet();
            return false;
        }

        let Some(sender) = packet.sender() else {
            warn!("dropping inbound packet without a sender");
            self.diagnostics.stale_packet();
            return false;
        };

        if packet.len() > self.max_packet_size || packet.channel() >= self.num_channels {
            warn!(
                "dropping {} byte packet on channel {} from {}: outside session limits",
                packet.len(),
                packet.channel(),
                sender
            );
            self.diagnostics.invalid_packet();
            return false;
        }

        // registry lock is released before the queue lock is taken
        if !self.registry.record_received(sender, packet.len()) {
            trace!("dropping packet from untracked peer {}", sender);
            self.diagnostics.stale_packet();
            return false;
        }

        self.queue.push(packet);
        true
    }
}

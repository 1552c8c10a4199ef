/// Delivery guarantee requested for one outgoing packet. Forwarded verbatim
/// to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PacketReliability {
    /// Fire and forget; may be dropped or reordered. Position updates and
    /// other high-frequency state.
    #[default]
    UnreliableUnordered,
    /// Eventually delivered, in any order. Independent one-off events.
    ReliableUnordered,
    /// Delivered in send order per (sender, peer, channel). Chat and other
    /// sequential protocol messages.
    ReliableOrdered,
}

impl PacketReliability {
    pub fn is_reliable(&self) -> bool {
        match self {
            PacketReliability::UnreliableUnordered => false,
            PacketReliability::ReliableUnordered | PacketReliability::ReliableOrdered => true,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, PacketReliability::ReliableOrdered)
    }
}

use peerlink_shared::PacketReliability;

/// Simulated network trouble applied by a [`LocalHub`](super::LocalHub).
///
/// Loss only ever hits `UnreliableUnordered` packets and reordering only the
/// two unordered tiers, so `ReliableOrdered` traffic always arrives complete
/// and in order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConditionerConfig {
    /// Chance in [0, 1] that an unreliable packet is dropped
    pub loss: f32,
    /// Chance in [0, 1] that an unordered packet jumps ahead of queued ones
    pub reorder: f32,
    /// Round trip reported when a link comes up, in milliseconds
    pub round_trip_ms: u32,
}

impl LinkConditionerConfig {
    pub fn new(loss: f32, reorder: f32, round_trip_ms: u32) -> Self {
        Self {
            loss: loss.clamp(0.0, 1.0),
            reorder: reorder.clamp(0.0, 1.0),
            round_trip_ms,
        }
    }

    pub fn perfect_condition() -> Self {
        Self::new(0.0, 0.0, 1)
    }

    pub fn average_condition() -> Self {
        Self::new(0.02, 0.05, 80)
    }

    pub fn poor_condition() -> Self {
        Self::new(0.2, 0.3, 300)
    }

    pub(crate) fn should_drop(&self, reliability: PacketReliability) -> bool {
        !reliability.is_reliable() && self.loss > 0.0 && fastrand::f32() < self.loss
    }

    /// Where to put a packet in a queue of `queued` packets
    pub(crate) fn insert_position(&self, reliability: PacketReliability, queued: usize) -> usize {
        if reliability.is_ordered() || queued == 0 || self.reorder <= 0.0 {
            return queued;
        }
        if fastrand::f32() < self.reorder {
            fastrand::usize(..queued)
        } else {
            queued
        }
    }
}

impl Default for LinkConditionerConfig {
    fn default() -> Self {
        Self::perfect_condition()
    }
}

use std::{fmt, num::NonZeroU32};

use peerlink_shared::Packet;

/// Handle to a scheduled broadcast, used to cancel it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BroadcastKey(u64);

impl fmt::Display for BroadcastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "broadcast-{}", self.0)
    }
}

/// How often a scheduled broadcast runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastCadence {
    /// On the next tick only
    Once,
    /// On the next tick, then every n ticks
    EveryTicks(NonZeroU32),
}

struct ScheduledBroadcast {
    key: BroadcastKey,
    packet: Packet,
    cadence: BroadcastCadence,
    ticks_until_due: u32,
}

/// Broadcasts queued by the application, run at the end of each tick
pub(crate) struct BroadcastSchedule {
    next_key: u64,
    entries: Vec<ScheduledBroadcast>,
}

impl BroadcastSchedule {
    pub fn new() -> Self {
        Self {
            next_key: 1,
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, packet: Packet, cadence: BroadcastCadence) -> BroadcastKey {
        let key = BroadcastKey(self.next_key);
        self.next_key += 1;
        self.entries.push(ScheduledBroadcast {
            key,
            packet,
            cadence,
            ticks_until_due: 0,
        });
        key
    }

    pub fn cancel(&mut self, key: &BroadcastKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != *key);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advance one tick and return the packets due now, in scheduling order
    pub fn take_due(&mut self) -> Vec<(BroadcastKey, Packet)> {
        let mut due = Vec::new();
        self.entries.retain_mut(|entry| {
            if entry.ticks_until_due > 0 {
                entry.ticks_until_due -= 1;
                return true;
            }
            match entry.cadence {
                BroadcastCadence::Once => {
                    due.push((entry.key, entry.packet.clone()));
                    false
                }
                BroadcastCadence::EveryTicks(interval) => {
                    due.push((entry.key, entry.packet.clone()));
                    entry.ticks_until_due = interval.get() - 1;
                    true
                }
            }
        });
        due
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for outcomes that are never raised as errors: rejected sends,
/// stale notifications, evicted packets. Shared by a session and all of its
/// producer handles.
#[derive(Default, Debug)]
pub struct Diagnostics {
    sends_delivered: AtomicU64,
    sends_rejected: AtomicU64,
    transport_failures: AtomicU64,
    stale_events: AtomicU64,
    stale_packets: AtomicU64,
    foreign_packets: AtomicU64,
    invalid_packets: AtomicU64,
    queue_overflow_drops: AtomicU64,
    packets_drained: AtomicU64,
}

/// Point-in-time copy of [`Diagnostics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub sends_delivered: u64,
    pub sends_rejected: u64,
    pub transport_failures: u64,
    pub stale_events: u64,
    pub stale_packets: u64,
    pub foreign_packets: u64,
    pub invalid_packets: u64,
    pub queue_overflow_drops: u64,
    pub packets_drained: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            sends_delivered: self.sends_delivered.load(Ordering::Relaxed),
            sends_rejected: self.sends_rejected.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            stale_events: self.stale_events.load(Ordering::Relaxed),
            stale_packets: self.stale_packets.load(Ordering::Relaxed),
            foreign_packets: self.foreign_packets.load(Ordering::Relaxed),
            invalid_packets: self.invalid_packets.load(Ordering::Relaxed),
            queue_overflow_drops: self.queue_overflow_drops.load(Ordering::Relaxed),
            packets_drained: self.packets_drained.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn send_delivered(&self) {
        self.sends_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn send_rejected(&self) {
        self.sends_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_event(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_packet(&self) {
        self.stale_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn foreign_packet(&self) {
        self.foreign_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn invalid_packet(&self) {
        self.invalid_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn queue_overflow(&self) {
        self.queue_overflow_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn packets_drained(&self, count: usize) {
        self.packets_drained.fetch_add(count as u64, Ordering::Relaxed);
    }
}

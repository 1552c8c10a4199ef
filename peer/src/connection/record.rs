use peerlink_shared::{ConnectionStatus, LinkPath, PeerId};

/// Smoothing factor for the round-trip estimate, as a divisor (1/8)
const RTT_SMOOTHING_DIVISOR: i64 = 8;

/// Bookkeeping for one peer link. Registry reads hand out clones, never
/// references into the live map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub peer_id: PeerId,
    pub status: ConnectionStatus,
    pub is_relay: bool,
    /// Smoothed round trip, `None` until the transport reports a sample
    pub round_trip_estimate_ms: Option<u32>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl ConnectionRecord {
    pub(crate) fn connecting(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            status: ConnectionStatus::Connecting,
            is_relay: false,
            round_trip_estimate_ms: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Connecting → Connected. Returns false (and changes nothing) from any
    /// other state.
    pub(crate) fn establish(&mut self, path: LinkPath) -> bool {
        if !self.status.is_connecting() {
            return false;
        }
        self.status = ConnectionStatus::Connected;
        self.is_relay = path.is_relay();
        true
    }

    /// Connecting → Failed. Returns false (and changes nothing) from any
    /// other state.
    pub(crate) fn fail(&mut self) -> bool {
        if !self.status.is_connecting() {
            return false;
        }
        self.status = ConnectionStatus::Failed;
        true
    }

    pub(crate) fn add_round_trip_sample(&mut self, sample_ms: u32) {
        let estimate = match self.round_trip_estimate_ms {
            None => sample_ms,
            Some(current) => {
                let current = i64::from(current);
                let delta = i64::from(sample_ms) - current;
                let next = current + delta / RTT_SMOOTHING_DIVISOR;
                u32::try_from(next.max(0)).unwrap_or(u32::MAX)
            }
        };
        self.round_trip_estimate_ms = Some(estimate);
    }
}

use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};
use parking_lot::Mutex;

use peerlink_shared::{ConnectionStatus, LinkPath, PeerId};

use crate::{connection::record::ConnectionRecord, Diagnostics};

/// Result of asking the registry to start tracking a peer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A fresh record was created; the transport should be asked to connect
    Created,
    AlreadyConnecting,
    AlreadyConnected,
    /// Self or an invalid id. Nothing changed.
    Rejected,
}

impl RequestOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, RequestOutcome::Created)
    }

    /// Whether the peer is tracked after the request
    pub fn is_tracked(&self) -> bool {
        !matches!(self, RequestOutcome::Rejected)
    }
}

/// Map of peer → connection record. One record per peer at most; every
/// read returns a copy.
///
/// Transitions per record: Connecting → Connected, Connecting → Failed, and
/// any state → removed. A removed or failed record never comes back; a new
/// request creates a new one.
pub struct ConnectionRegistry {
    self_id: PeerId,
    connections: Mutex<HashMap<PeerId, ConnectionRecord>>,
    diagnostics: Arc<Diagnostics>,
}

impl ConnectionRegistry {
    pub fn new(self_id: PeerId, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            self_id,
            connections: Mutex::new(HashMap::new()),
            diagnostics,
        }
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    // Requests

    /// Start tracking an outgoing connection to `peer`
    pub fn request_connect(&self, peer: &PeerId) -> RequestOutcome {
        self.open(peer, "connect")
    }

    /// Start tracking a connection `peer` asked us for
    pub fn accept_incoming(&self, peer: &PeerId) -> RequestOutcome {
        self.open(peer, "accept")
    }

    fn open(&self, peer: &PeerId, action: &str) -> RequestOutcome {
        if !peer.is_valid() || *peer == self.self_id {
            warn!("registry: refusing to {} {}", action, peer);
            return RequestOutcome::Rejected;
        }

        let mut connections = self.connections.lock();
        if let Some(existing) = connections.get(peer) {
            match existing.status {
                ConnectionStatus::Connecting => return RequestOutcome::AlreadyConnecting,
                ConnectionStatus::Connected => return RequestOutcome::AlreadyConnected,
                ConnectionStatus::Failed | ConnectionStatus::Disconnected => {
                    debug!("registry: replacing {:?} record for {}", existing.status, peer);
                }
            }
        }
        connections.insert(peer.clone(), ConnectionRecord::connecting(peer.clone()));
        RequestOutcome::Created
    }

    // Transport notifications

    /// Connecting → Connected. Returns false for stale notifications: no
    /// record, or a record that is not Connecting.
    pub fn record_established(&self, peer: &PeerId, path: LinkPath) -> bool {
        let established = {
            let mut connections = self.connections.lock();
            connections
                .get_mut(peer)
                .map(|record| record.establish(path))
                .unwrap_or(false)
        };
        if established {
            info!("registry: connected to {} ({:?})", peer, path);
        } else {
            self.stale("established", peer);
        }
        established
    }

    /// Connecting → Failed. Returns false for stale notifications.
    pub fn record_failed(&self, peer: &PeerId) -> bool {
        let failed = {
            let mut connections = self.connections.lock();
            connections
                .get_mut(peer)
                .map(|record| record.fail())
                .unwrap_or(false)
        };
        if failed {
            warn!("registry: connection to {} failed", peer);
        } else {
            self.stale("failed", peer);
        }
        failed
    }

    /// Remove the record of a link the transport reports closed. `None`
    /// means there was nothing to close.
    pub fn record_closed(&self, peer: &PeerId) -> Option<ConnectionRecord> {
        let removed = self.connections.lock().remove(peer);
        match &removed {
            Some(_) => info!("registry: connection to {} closed", peer),
            None => self.stale("closed", peer),
        }
        removed
    }

    pub fn record_round_trip(&self, peer: &PeerId, sample_ms: u32) -> bool {
        let updated = {
            let mut connections = self.connections.lock();
            match connections.get_mut(peer) {
                Some(record) => {
                    record.add_round_trip_sample(sample_ms);
                    true
                }
                None => false,
            }
        };
        if !updated {
            self.stale("round trip", peer);
        }
        updated
    }

    pub fn record_sent(&self, peer: &PeerId, bytes: usize) -> bool {
        let mut connections = self.connections.lock();
        match connections.get_mut(peer) {
            Some(record) => {
                record.bytes_sent += bytes as u64;
                true
            }
            None => false,
        }
    }

    /// Credit received traffic. False if the peer is not tracked, in which
    /// case the packet should be dropped.
    pub fn record_received(&self, peer: &PeerId, bytes: usize) -> bool {
        let mut connections = self.connections.lock();
        match connections.get_mut(peer) {
            Some(record) => {
                record.bytes_received += bytes as u64;
                true
            }
            None => false,
        }
    }

    // Local teardown

    /// Drop the record for `peer` right away, regardless of any handshake in
    /// flight. Notifications that arrive for it later are stale.
    pub fn disconnect(&self, peer: &PeerId) -> Option<ConnectionRecord> {
        let removed = self.connections.lock().remove(peer);
        if removed.is_some() {
            info!("registry: disconnected from {}", peer);
        }
        removed
    }

    pub fn disconnect_all(&self) -> Vec<ConnectionRecord> {
        let removed: Vec<ConnectionRecord> = {
            let mut connections = self.connections.lock();
            connections.drain().map(|(_, record)| record).collect()
        };
        if !removed.is_empty() {
            info!("registry: disconnected from {} peers", removed.len());
        }
        removed
    }

    // Reads

    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.connections.lock().values().cloned().collect()
    }

    pub fn lookup(&self, peer: &PeerId) -> Option<ConnectionRecord> {
        self.connections.lock().get(peer).cloned()
    }

    /// Status of `peer`, Disconnected when there is no record
    pub fn status(&self, peer: &PeerId) -> ConnectionStatus {
        self.connections
            .lock()
            .get(peer)
            .map(|record| record.status)
            .unwrap_or(ConnectionStatus::Disconnected)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.connections.lock().contains_key(peer)
    }

    pub fn count_connected(&self) -> usize {
        self.connections
            .lock()
            .values()
            .filter(|record| record.is_connected())
            .count()
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.connections
            .lock()
            .values()
            .filter(|record| record.is_connected())
            .map(|record| record.peer_id.clone())
            .collect()
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.connections.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    fn stale(&self, event: &str, peer: &PeerId) {
        debug!("registry: ignoring stale {} notification for {}", event, peer);
        self.diagnostics.stale_event();
    }
}

use std::{mem, sync::Arc};

use log::{debug, info, trace, warn};

use peerlink_shared::{
    ChannelIndex, ConfigError, ConnectionStatus, IdentitySource, InboundPacket, LinkPath,
    MembershipEvent, MembershipSource, Packet, PacketReliability, PeerId, RosterMember, SendError,
    Transport, TransportError, TransportEvent,
};

use crate::{
    events::{DisconnectReason, Events},
    packet_queue::{InboundSender, PacketQueue},
    send_path::{BroadcastReport, SendPath},
    session::{BroadcastCadence, BroadcastKey, BroadcastSchedule, SessionConfig},
    topology::{TopologyAction, TopologyReconciler},
    ConnectionRecord, ConnectionRegistry, Diagnostics, DiagnosticsSnapshot, PeerLinkError,
    RequestOutcome,
};

type PacketHandler = Box<dyn FnMut(Packet) + Send>;

/// A peer's view of its group: owns the transport, tracks one connection
/// record per remote peer and buffers inbound packets until the application
/// drains them.
///
/// Everything runs on the caller's thread during `receive` / `tick`, except
/// inbound delivery through an [`InboundSender`], which may happen anywhere.
pub struct PeerSession<T: Transport> {
    config: SessionConfig,
    self_id: PeerId,
    transport: T,
    accept_all: bool,
    registry: Arc<ConnectionRegistry>,
    queue: PacketQueue,
    inbound: InboundSender,
    send_path: SendPath,
    topology: TopologyReconciler,
    broadcasts: BroadcastSchedule,
    packet_handler: Option<PacketHandler>,
    diagnostics: Arc<Diagnostics>,
    incoming_events: Events,
}

impl<T: Transport> PeerSession<T> {
    /// Create a new PeerSession and bind its transport to the configured
    /// namespace
    pub fn new(
        config: SessionConfig,
        identity: &dyn IdentitySource,
        mut transport: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let self_id = identity.self_id();
        if !self_id.is_valid() {
            warn!("cannot start a session without a local identity");
            return Err(ConfigError::MissingIdentity);
        }

        transport.bind(&config.namespace_id, config.allow_relay)?;
        if config.auto_accept {
            transport.accept_connection(None);
        }

        let diagnostics = Arc::new(Diagnostics::new());
        let registry = Arc::new(ConnectionRegistry::new(self_id.clone(), diagnostics.clone()));
        let queue = PacketQueue::with_capacity(config.inbound_capacity, diagnostics.clone());
        let inbound = InboundSender::new(
            Arc::from(config.namespace_id.as_str()),
            config.max_packet_size,
            config.num_channels,
            queue.clone(),
            registry.clone(),
            diagnostics.clone(),
        );
        let send_path = SendPath::new(
            config.max_packet_size,
            config.num_channels,
            registry.clone(),
            diagnostics.clone(),
        );

        info!(
            "session {} bound to namespace '{}' (relay {})",
            self_id,
            config.namespace_id,
            if config.allow_relay { "allowed" } else { "refused" }
        );

        Ok(Self {
            accept_all: config.auto_accept,
            topology: TopologyReconciler::new(self_id.clone()),
            broadcasts: BroadcastSchedule::new(),
            packet_handler: None,
            incoming_events: Events::new(),
            config,
            self_id,
            transport,
            registry,
            queue,
            inbound,
            send_path,
            diagnostics,
        })
    }

    /// Must be called regularly, maintains connection to and receives
    /// packets from all peers
    pub fn receive(&mut self) -> Events {
        self.maintain_transport();

        // return all received events and reset the buffer
        mem::take(&mut self.incoming_events)
    }

    /// One frame of work: pump the transport, hand up to `drain_budget`
    /// packets to the packet handler, then run scheduled broadcasts
    pub fn tick(&mut self) -> Events {
        self.maintain_transport();
        self.drain(self.config.drain_budget);
        self.run_scheduled_broadcasts();

        mem::take(&mut self.incoming_events)
    }

    // Connections

    /// Start connecting to `peer`. Returns true when the peer is being
    /// connected to or already is.
    pub fn connect(&mut self, peer: &PeerId) -> bool {
        match self.open_link(peer) {
            Ok(outcome) => outcome.is_tracked(),
            Err(_) => false,
        }
    }

    /// Accept a connection request from `peer`, or with `None`, accept every
    /// request from now on
    pub fn accept(&mut self, peer: Option<&PeerId>) {
        match peer {
            Some(peer) => {
                if self.accept_link(peer).is_tracked() {
                    self.transport.accept_connection(Some(peer));
                }
            }
            None => {
                debug!("accepting all incoming connections");
                self.accept_all = true;
                self.transport.accept_connection(None);
            }
        }
    }

    /// Decline a connection request raised as `ConnectionRequestEvent`
    pub fn reject(&mut self, peer: &PeerId) {
        if !self.registry.contains(peer) {
            debug!("rejecting connection request from {}", peer);
            self.transport.close_connection(peer);
        }
    }

    /// Close the link to `peer`. Returns false if there was none.
    pub fn disconnect(&mut self, peer: &PeerId) -> bool {
        if self.close_link(peer) {
            self.incoming_events
                .push_disconnection(peer, DisconnectReason::Local);
            true
        } else {
            false
        }
    }

    pub fn disconnect_all(&mut self) -> usize {
        let removed = self.registry.disconnect_all();
        for record in &removed {
            self.transport.close_connection(&record.peer_id);
            self.incoming_events
                .push_disconnection(&record.peer_id, DisconnectReason::Local);
        }
        removed.len()
    }

    /// Close every link and drop buffered packets and scheduled broadcasts.
    /// Disconnect events are still returned by the next `receive`.
    pub fn shutdown(&mut self) {
        let closed = self.disconnect_all();
        let dropped = self.queue.clear();
        self.broadcasts.clear();
        info!(
            "session {} shut down: closed {} links, dropped {} queued packets",
            self.self_id, closed, dropped
        );
    }

    // Sending

    pub fn send(
        &mut self,
        peer: &PeerId,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> bool {
        self.try_send(peer, payload, channel, reliability).is_ok()
    }

    pub fn try_send(
        &mut self,
        peer: &PeerId,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> Result<(), SendError> {
        self.send_path
            .send(&mut self.transport, peer, payload, channel, reliability)
    }

    /// Send to every currently Connected peer
    pub fn broadcast(
        &mut self,
        payload: &[u8],
        channel: ChannelIndex,
        reliability: PacketReliability,
    ) -> BroadcastReport {
        self.send_path
            .broadcast(&mut self.transport, payload, channel, reliability)
    }

    /// Queue a broadcast to run at the end of upcoming ticks. The packet is
    /// checked now, so a bad payload or channel never reaches the schedule.
    pub fn schedule_broadcast(
        &mut self,
        payload: impl Into<Box<[u8]>>,
        channel: ChannelIndex,
        reliability: PacketReliability,
        cadence: BroadcastCadence,
    ) -> Result<BroadcastKey, SendError> {
        let packet = Packet::outgoing(payload, channel, reliability);
        self.send_path.validate_packet(packet.payload(), channel)?;
        let key = self.broadcasts.insert(packet, cadence);
        debug!("scheduled {} ({:?})", key, cadence);
        Ok(key)
    }

    pub fn cancel_broadcast(&mut self, key: &BroadcastKey) -> bool {
        self.broadcasts.cancel(key)
    }

    pub fn scheduled_broadcasts(&self) -> usize {
        self.broadcasts.len()
    }

    // Receiving

    /// Register the callback that receives drained packets. Replaces any
    /// previous handler.
    pub fn on_packet(&mut self, handler: impl FnMut(Packet) + Send + 'static) {
        self.packet_handler = Some(Box::new(handler));
    }

    /// Hand up to `max_count` queued packets to the packet handler, oldest
    /// first. Returns how many were taken off the queue.
    pub fn drain(&mut self, max_count: usize) -> usize {
        let mut drained = 0;
        while drained < max_count {
            // the queue lock is released once pop returns
            let Some(packet) = self.queue.pop() else {
                break;
            };
            drained += 1;
            match self.packet_handler.as_mut() {
                Some(handler) => handler(packet),
                None => trace!("no packet handler, discarding {} bytes", packet.len()),
            }
        }
        if drained > 0 {
            self.diagnostics.packets_drained(drained);
        }
        drained
    }

    /// Producer handle for transports that deliver packets from their own
    /// thread
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound.clone()
    }

    pub fn queued_packets(&self) -> usize {
        self.queue.len()
    }

    // Membership

    pub fn apply_membership(&mut self, event: MembershipEvent) {
        let actions = match event {
            MembershipEvent::Joined(member) => self.topology.member_joined(member, &self.registry),
            MembershipEvent::Left(peer) => self.topology.member_left(&peer, &self.registry),
            MembershipEvent::RoleChanged { peer, role } => self.topology.role_changed(&peer, role),
        };
        self.apply_topology(actions);
    }

    /// Bring links in line with a full roster
    pub fn sync_roster(&mut self, roster: &[RosterMember]) {
        let actions = self.topology.sync_roster(roster, &self.registry);
        self.apply_topology(actions);
    }

    /// Apply every membership change `source` has pending
    pub fn receive_membership(&mut self, source: &mut dyn MembershipSource) {
        while let Some(event) = source.poll_event() {
            self.apply_membership(event);
        }
    }

    /// Sync against the roster `source` currently reports
    pub fn sync_membership(&mut self, source: &dyn MembershipSource) {
        let roster = source.current_roster();
        self.sync_roster(&roster);
    }

    pub fn member(&self, peer: &PeerId) -> Option<&RosterMember> {
        self.topology.member(peer)
    }

    pub fn members(&self) -> impl Iterator<Item = &RosterMember> {
        self.topology.members()
    }

    // Reads

    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.registry.snapshot()
    }

    pub fn lookup(&self, peer: &PeerId) -> Option<ConnectionRecord> {
        self.registry.lookup(peer)
    }

    pub fn status(&self, peer: &PeerId) -> ConnectionStatus {
        self.registry.status(peer)
    }

    /// Number of Connected peers
    pub fn peer_count(&self) -> usize {
        self.registry.count_connected()
    }

    pub fn is_connected_to(&self, peer: &PeerId) -> bool {
        self.registry.status(peer).is_connected()
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // Private methods

    fn maintain_transport(&mut self) {
        // lifecycle first, so packets from a link that just came up are not
        // treated as stale
        while let Some(event) = self.transport.poll_event() {
            self.handle_transport_event(event);
        }

        while let Some(InboundPacket { namespace, packet }) = self.transport.poll_inbound() {
            self.inbound.deliver(&namespace, packet);
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionRequested(peer) => self.connection_requested(&peer),
            TransportEvent::ConnectionEstablished(peer, path) => {
                self.connection_established(&peer, path)
            }
            TransportEvent::ConnectionFailed(peer) => {
                if self.registry.record_failed(&peer) {
                    self.incoming_events
                        .push_disconnection(&peer, DisconnectReason::Failed);
                }
            }
            TransportEvent::ConnectionClosed(peer) => {
                // a failed link was already reported when it failed
                if let Some(record) = self.registry.record_closed(&peer) {
                    if record.status != ConnectionStatus::Failed {
                        self.incoming_events
                            .push_disconnection(&peer, DisconnectReason::Closed);
                    }
                }
            }
            TransportEvent::RoundTrip(peer, sample_ms) => {
                self.registry.record_round_trip(&peer, sample_ms);
            }
        }
    }

    fn connection_requested(&mut self, peer: &PeerId) {
        if !self.accept_all {
            debug!("connection request from {} awaits accept", peer);
            self.incoming_events.push_request(peer);
            return;
        }
        if self.accept_link(peer).is_tracked() {
            self.transport.accept_connection(Some(peer));
        }
    }

    fn connection_established(&mut self, peer: &PeerId, path: LinkPath) {
        if path.is_relay() && !self.config.allow_relay {
            if self.registry.record_failed(peer) {
                warn!("refusing relayed link to {}", peer);
                self.transport.close_connection(peer);
                self.incoming_events
                    .push_disconnection(peer, DisconnectReason::RelayRefused);
            }
            return;
        }
        if self.registry.record_established(peer, path) {
            self.incoming_events.push_connection(peer);
        }
    }

    fn open_link(&mut self, peer: &PeerId) -> Result<RequestOutcome, TransportError> {
        let outcome = self.registry.request_connect(peer);
        if !outcome.is_created() {
            trace!("connect to {}: {:?}", peer, outcome);
            return Ok(outcome);
        }
        self.topology.link_opened(peer);

        if let Err(error) = self.transport.request_connection(peer) {
            self.diagnostics.transport_failure();
            warn!("transport could not connect to {}: {}", peer, error);
            self.registry.record_failed(peer);
            return Err(error);
        }
        debug!("connecting to {}", peer);
        Ok(outcome)
    }

    fn accept_link(&mut self, peer: &PeerId) -> RequestOutcome {
        let outcome = self.registry.accept_incoming(peer);
        if outcome.is_created() {
            self.topology.link_opened(peer);
        }
        outcome
    }

    /// Drop the record and tell the transport, without raising an event
    fn close_link(&mut self, peer: &PeerId) -> bool {
        if self.registry.disconnect(peer).is_some() {
            self.transport.close_connection(peer);
            true
        } else {
            false
        }
    }

    fn apply_topology(&mut self, actions: Vec<TopologyAction>) {
        for action in actions {
            match action {
                TopologyAction::Connect(peer) => {
                    if let Err(source) = self.open_link(&peer) {
                        self.incoming_events.push_error(PeerLinkError::Connect {
                            peer: peer.to_string(),
                            source,
                        });
                    }
                }
                TopologyAction::Disconnect(peer) => {
                    self.close_link(&peer);
                }
                TopologyAction::NotifyDeparted(peer) => {
                    self.incoming_events
                        .push_disconnection(&peer, DisconnectReason::MemberLeft);
                }
            }
        }
    }

    fn run_scheduled_broadcasts(&mut self) {
        for (key, packet) in self.broadcasts.take_due() {
            let report = self.send_path.broadcast(
                &mut self.transport,
                packet.payload(),
                packet.channel(),
                packet.reliability(),
            );
            trace!(
                "{}: delivered to {}/{} peers",
                key,
                report.delivered,
                report.attempted
            );
        }
    }
}

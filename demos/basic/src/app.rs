use std::{
    num::NonZeroU32,
    sync::mpsc::{self, Receiver},
};

use log::{info, warn};

use peerlink_peer::{
    shared::{FixedIdentity, Packet, PacketReliability, PeerId},
    transport::local::{LocalHub, LocalTransport},
    BroadcastCadence, ConnectEvent, DisconnectEvent, ErrorEvent, PeerSession, SessionConfig,
};

use crate::lobby::LobbyFeed;

const CHAT: u8 = 0;
const STATE: u8 = 1;

type Session = PeerSession<LocalTransport>;

pub struct App {
    session: Session,
    inbox: Receiver<Packet>,
    frame: u32,
    pings_sent: u32,
}

impl App {
    pub fn new(hub: &LocalHub, id: &PeerId, feed: &LobbyFeed) -> Result<Self, String> {
        let config = SessionConfig::with_namespace("BasicDemo");
        let mut session = Session::new(config, &FixedIdentity::new(id.clone()), hub.endpoint(id.clone()))
            .map_err(|error| format!("could not start session for {}: {}", id, error))?;

        let (sender, inbox) = mpsc::channel();
        session.on_packet(move |packet| {
            let _ = sender.send(packet);
        });

        session.sync_membership(feed);

        let every_five = NonZeroU32::new(5).map(BroadcastCadence::EveryTicks);
        if let Some(cadence) = every_five {
            let position = format!("{} is at (0, 0)", id).into_bytes();
            if let Err(error) =
                session.schedule_broadcast(position, STATE, PacketReliability::UnreliableUnordered, cadence)
            {
                warn!("{}: could not schedule position updates: {}", id, error);
            }
        }

        info!("{} joined the demo", id);
        Ok(Self {
            session,
            inbox,
            frame: 0,
            pings_sent: 0,
        })
    }

    pub fn id(&self) -> &PeerId {
        self.session.self_id()
    }

    pub fn update(&mut self, feed: Option<&mut LobbyFeed>) {
        self.frame += 1;
        if let Some(feed) = feed {
            self.session.receive_membership(feed);
        }

        let mut events = self.session.tick();
        for peer in events.read::<ConnectEvent>() {
            info!("{}: connected to {}", self.id(), peer);
        }
        for (peer, reason) in events.read::<DisconnectEvent>() {
            info!("{}: lost {} ({:?})", self.id(), peer, reason);
        }
        for error in events.read::<ErrorEvent>() {
            warn!("{}: {}", self.id(), error);
        }

        let received: Vec<Packet> = self.inbox.try_iter().collect();
        for packet in received {
            self.handle_packet(packet);
        }

        if self.frame % 4 == 0 && self.session.peer_count() > 0 {
            self.pings_sent += 1;
            let ping = format!("ping {}", self.pings_sent);
            let report = self
                .session
                .broadcast(ping.as_bytes(), CHAT, PacketReliability::ReliableOrdered);
            info!(
                "{}: sent '{}' to {}/{} peers",
                self.id(),
                ping,
                report.delivered,
                report.attempted
            );
        }
    }

    pub fn shutdown(&mut self) {
        let stats = self.session.diagnostics();
        info!(
            "{}: {} sends delivered, {} rejected, {} packets drained, {} lost to overflow",
            self.id(),
            stats.sends_delivered,
            stats.sends_rejected,
            stats.packets_drained,
            stats.queue_overflow_drops
        );
        self.session.shutdown();
    }

    fn handle_packet(&mut self, packet: Packet) {
        let Some(sender) = packet.sender().cloned() else {
            return;
        };
        let text = String::from_utf8_lossy(packet.payload()).to_string();
        match packet.channel() {
            CHAT => {
                info!("{}: '{}' from {}", self.id(), text, sender);
                if let Some(count) = text.strip_prefix("ping ") {
                    let pong = format!("pong {}", count);
                    if let Err(error) =
                        self.session
                            .try_send(&sender, pong.as_bytes(), CHAT, PacketReliability::ReliableOrdered)
                    {
                        warn!("{}: could not answer {}: {}", self.id(), sender, error);
                    }
                }
            }
            _ => log::trace!("{}: state from {}: {}", self.id(), sender, text),
        }
    }
}

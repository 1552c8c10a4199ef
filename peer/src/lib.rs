//! # Peerlink Peer
//! Coordinates the links of a small, changing group of peers: connects and
//! disconnects them as the group roster changes, sends packets with a chosen
//! reliability tier, and buffers inbound packets until the application drains
//! them on its own tick.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use peerlink_shared::{
        ChannelIndex, ConnectionStatus, FixedIdentity, IdentitySource, InboundPacket, LinkPath,
        MemberRole, MembershipEvent, MembershipSource, Packet, PacketReliability, PeerId,
        RosterMember, Transport, TransportError, TransportEvent,
    };
}

mod connection;
mod diagnostics;
mod error;
mod events;
mod packet_queue;
mod send_path;
mod session;
mod topology;

pub use connection::{
    record::ConnectionRecord,
    registry::{ConnectionRegistry, RequestOutcome},
};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use error::PeerLinkError;
pub use events::{
    ConnectEvent, ConnectionRequestEvent, DisconnectEvent, DisconnectReason, ErrorEvent, Event,
    Events,
};
pub use packet_queue::{InboundSender, PacketQueue, PushOutcome};
pub use peerlink_shared::{ConfigError, SendError};
pub use send_path::BroadcastReport;
pub use session::{BroadcastCadence, BroadcastKey, PeerSession, SessionConfig};
pub use topology::{TopologyAction, TopologyReconciler};

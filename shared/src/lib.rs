//! # Peerlink Shared
//! Common functionality shared between peerlink sessions, the transports they
//! drive, and the identity/membership collaborators they consume.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod connection_status;
mod constants;
mod error;
mod identity;
mod membership;
mod packet;
mod reliability;
mod transport;
mod types;

pub use connection_status::{ConnectionStatus, LinkPath};
pub use constants::{
    DEFAULT_DRAIN_BUDGET, DEFAULT_INBOUND_CAPACITY, DEFAULT_MAX_PACKET_SIZE,
    DEFAULT_NAMESPACE, DEFAULT_NUM_CHANNELS, MAX_NAMESPACE_LEN,
};
pub use error::{ConfigError, SendError};
pub use identity::{FixedIdentity, IdentitySource};
pub use membership::{MemberRole, MembershipEvent, MembershipSource, RosterMember};
pub use packet::Packet;
pub use reliability::PacketReliability;
pub use transport::{
    error::TransportError, InboundPacket, Transport, TransportEvent,
};
pub use types::{ChannelIndex, PeerId};

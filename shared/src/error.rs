use thiserror::Error;

use crate::{transport::error::TransportError, ConnectionStatus};

/// Errors raised while validating a session's configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No identity has been issued yet
    #[error("No local peer identity available. Log in before creating a session")]
    MissingIdentity,

    /// Namespace is empty
    #[error("Namespace must not be empty")]
    EmptyNamespace,

    /// Namespace is longer than platform socket names allow
    #[error("Namespace '{namespace}' is {len} characters long, the limit is {max}")]
    NamespaceTooLong {
        namespace: String,
        len: usize,
        max: usize,
    },

    /// Namespace contains something other than ASCII letters and digits
    #[error("Namespace '{namespace}' must contain only ASCII letters and digits")]
    InvalidNamespace { namespace: String },

    /// At least one channel is required
    #[error("num_channels must be at least 1")]
    NoChannels,

    /// Packets must be able to carry at least one byte
    #[error("max_packet_size must be at least 1 byte")]
    ZeroPacketSize,

    /// Inbound queue must hold at least one packet
    #[error("inbound_capacity must be at least 1 packet")]
    ZeroInboundCapacity,

    /// Transport refused to bind to the namespace
    #[error("Transport could not bind namespace: {0}")]
    Bind(#[from] TransportError),
}

/// Reasons a send is refused. None of these are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Target id is empty
    #[error("Cannot send to an invalid peer id")]
    InvalidPeer,

    /// Nothing to send
    #[error("Cannot send an empty payload")]
    EmptyPayload,

    /// Payload exceeds the configured maximum
    #[error("Packet too large ({len} > {max} bytes)")]
    PayloadTooLarge { len: usize, max: usize },

    /// Channel index outside the configured range
    #[error("Channel {channel} is out of range, the session has {num_channels} channels")]
    ChannelOutOfRange { channel: u8, num_channels: u8 },

    /// The peer has no connection record
    #[error("No connection to peer {peer}")]
    UnknownPeer { peer: String },

    /// The peer has a record, but it cannot carry traffic
    #[error("Peer {peer} cannot receive packets while {status:?}")]
    PeerNotConnected {
        peer: String,
        status: ConnectionStatus,
    },

    /// The transport refused the packet
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SendError {
    /// Whether the error comes from local validation rather than the network
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SendError::InvalidPeer
                | SendError::EmptyPayload
                | SendError::PayloadTooLarge { .. }
                | SendError::ChannelOutOfRange { .. }
        )
    }
}

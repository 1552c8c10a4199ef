use thiserror::Error;

/// Failures of the underlying peer-to-peer transport. Surfaced per call;
/// retrying is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Transport has not been bound to a namespace
    #[error("Transport is not bound to a namespace")]
    NotBound,

    /// Endpoint was bound twice
    #[error("Endpoint is already bound to namespace '{namespace}'")]
    AlreadyBound { namespace: String },

    /// No route to the peer
    #[error("Peer {peer} is unreachable")]
    Unreachable { peer: String },

    /// Connection request could not be issued
    #[error("Connection request to {peer} failed: {reason}")]
    RequestFailed { peer: String, reason: String },

    /// Packet could not be queued for sending
    #[error("Failed to send {len} bytes to {peer}")]
    SendFailed { peer: String, len: usize },
}

use thiserror::Error;

use peerlink_shared::TransportError;

/// Session-level failures, reported through `ErrorEvent` rather than
/// returned, since they happen while pumping the transport or applying
/// roster changes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerLinkError {
    /// The transport could not start a connection
    #[error("Could not connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: TransportError,
    },
}

use std::sync::Once;

use peerlink_peer::{
    shared::{FixedIdentity, LinkPath, MemberRole, PeerId, RosterMember},
    transport::local::{LocalHub, LocalTransport},
    PeerSession, SessionConfig,
};

use crate::RecordingTransport;

pub const TEST_NAMESPACE: &str = "TestGame";

static LOGGER: Once = Once::new();

/// Install env_logger once per test binary. Honors RUST_LOG.
pub fn init_logger() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn peer(id: &str) -> PeerId {
    PeerId::from(id)
}

pub fn member(id: &str) -> RosterMember {
    RosterMember::new(id, format!("Player {}", id), MemberRole::Member)
}

/// Session for `self_id` over a fresh RecordingTransport
pub fn recording_session(self_id: &str) -> PeerSession<RecordingTransport> {
    session_with(self_id, SessionConfig::with_namespace(TEST_NAMESPACE))
}

pub fn session_with(self_id: &str, config: SessionConfig) -> PeerSession<RecordingTransport> {
    init_logger();
    PeerSession::new(config, &FixedIdentity::new(self_id), RecordingTransport::new())
        .expect("test session config is valid")
}

/// Session for `self_id` registered on `hub`
pub fn local_session(
    hub: &LocalHub,
    self_id: &str,
    config: SessionConfig,
) -> PeerSession<LocalTransport> {
    init_logger();
    PeerSession::new(config, &FixedIdentity::new(self_id), hub.endpoint(self_id))
        .expect("test session config is valid")
}

/// Connect `session` to `id` and complete the handshake on the recording
/// transport. Events raised along the way are discarded.
pub fn connected_peer(session: &mut PeerSession<RecordingTransport>, id: &str) -> PeerId {
    let peer = peer(id);
    session.connect(&peer);
    session
        .transport_mut()
        .establish(&peer, LinkPath::Direct);
    session.receive();
    peer
}

mod broadcast_schedule;
pub use broadcast_schedule::{BroadcastCadence, BroadcastKey};
pub(crate) use broadcast_schedule::BroadcastSchedule;

mod session_config;
pub use session_config::SessionConfig;

mod peer_session;
pub use peer_session::PeerSession;

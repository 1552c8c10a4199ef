use crate::PeerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MemberRole {
    Owner,
    #[default]
    Member,
}

/// One entry of a group roster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterMember {
    pub peer_id: PeerId,
    pub display_name: String,
    pub role: MemberRole,
}

impl RosterMember {
    pub fn new(peer_id: impl Into<PeerId>, display_name: impl Into<String>, role: MemberRole) -> Self {
        Self {
            peer_id: peer_id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

/// Discrete roster change reported by a membership source
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MembershipEvent {
    Joined(RosterMember),
    Left(PeerId),
    /// Ownership or other role change. Never affects connections.
    RoleChanged { peer: PeerId, role: MemberRole },
}

/// A group whose roster drives which peers a session connects to
pub trait MembershipSource {
    /// Snapshot of the group, in roster order
    fn current_roster(&self) -> Vec<RosterMember>;

    /// Next pending change, if any
    fn poll_event(&mut self) -> Option<MembershipEvent>;
}

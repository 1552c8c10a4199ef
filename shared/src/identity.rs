use crate::PeerId;

/// Supplies the id this process is known by. Sessions never connect to it.
pub trait IdentitySource {
    fn self_id(&self) -> PeerId;

    fn is_self(&self, peer: &PeerId) -> bool {
        self.self_id() == *peer
    }
}

/// An identity that was resolved up front, e.g. after a completed login
#[derive(Clone, Debug)]
pub struct FixedIdentity {
    id: PeerId,
}

impl FixedIdentity {
    pub fn new(id: impl Into<PeerId>) -> Self {
        Self { id: id.into() }
    }

    /// Identity of a process that has not logged in
    pub fn logged_out() -> Self {
        Self {
            id: PeerId::invalid(),
        }
    }
}

impl IdentitySource for FixedIdentity {
    fn self_id(&self) -> PeerId {
        self.id.clone()
    }
}

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use peerlink_shared::{ConnectionStatus, MemberRole, PeerId, RosterMember};

use crate::ConnectionRegistry;

/// Work the session must carry out to bring links in line with the roster
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyAction {
    Connect(PeerId),
    Disconnect(PeerId),
    /// Tell the application the member is gone, whether or not a link ever
    /// came up
    NotifyDeparted(PeerId),
}

/// Turns membership changes into connect / disconnect decisions.
///
/// Keeps its own mirror of the roster; the registry is only read. Every
/// departed member is reported exactly once until it joins again or a new
/// link to it is opened. A tracked non-member is always disconnected.
pub struct TopologyReconciler {
    self_id: PeerId,
    members: HashMap<PeerId, RosterMember>,
    departed: HashSet<PeerId>,
}

impl TopologyReconciler {
    pub fn new(self_id: PeerId) -> Self {
        Self {
            self_id,
            members: HashMap::new(),
            departed: HashSet::new(),
        }
    }

    pub fn member(&self, peer: &PeerId) -> Option<&RosterMember> {
        self.members.get(peer)
    }

    pub fn members(&self) -> impl Iterator<Item = &RosterMember> {
        self.members.values()
    }

    /// A fresh record was opened for `peer`, so a later departure starts a
    /// new report
    pub fn link_opened(&mut self, peer: &PeerId) {
        self.departed.remove(peer);
    }

    pub fn member_joined(
        &mut self,
        member: RosterMember,
        registry: &ConnectionRegistry,
    ) -> Vec<TopologyAction> {
        let peer = member.peer_id.clone();
        if !peer.is_valid() {
            debug!("topology: ignoring join of a member without an id");
            return Vec::new();
        }

        info!("topology: {} ({}) joined", member.display_name, peer);
        self.members.insert(peer.clone(), member);
        self.departed.remove(&peer);

        if peer == self.self_id {
            return Vec::new();
        }
        if Self::needs_connect(&peer, registry) {
            vec![TopologyAction::Connect(peer)]
        } else {
            Vec::new()
        }
    }

    pub fn member_left(&mut self, peer: &PeerId, registry: &ConnectionRegistry) -> Vec<TopologyAction> {
        if !peer.is_valid() {
            return Vec::new();
        }

        if *peer == self.self_id {
            info!("topology: left the group, dropping all links");
            self.members.clear();
            let mut actions = Vec::new();
            for tracked in registry.peers() {
                self.depart(&tracked, registry, &mut actions);
            }
            return actions;
        }

        self.members.remove(peer);
        let mut actions = Vec::new();
        self.depart(peer, registry, &mut actions);
        actions
    }

    /// Ownership and other role changes never touch connections
    pub fn role_changed(&mut self, peer: &PeerId, role: MemberRole) -> Vec<TopologyAction> {
        if let Some(member) = self.members.get_mut(peer) {
            debug!("topology: {} is now {:?}", peer, role);
            member.role = role;
        }
        Vec::new()
    }

    /// Replace the mirror with a full roster and diff it against the
    /// registry: connect to members without a live link, drop links to
    /// anyone no longer listed.
    pub fn sync_roster(
        &mut self,
        roster: &[RosterMember],
        registry: &ConnectionRegistry,
    ) -> Vec<TopologyAction> {
        let previous = std::mem::take(&mut self.members);
        let mut actions = Vec::new();

        for member in roster {
            let peer = &member.peer_id;
            if !peer.is_valid() {
                continue;
            }
            self.members.insert(peer.clone(), member.clone());
            self.departed.remove(peer);
            if *peer != self.self_id && Self::needs_connect(peer, registry) {
                actions.push(TopologyAction::Connect(peer.clone()));
            }
        }

        let mut gone: Vec<PeerId> = registry
            .peers()
            .into_iter()
            .filter(|peer| !self.members.contains_key(peer))
            .collect();
        for peer in previous.into_keys() {
            if !self.members.contains_key(&peer) && peer != self.self_id && !gone.contains(&peer) {
                gone.push(peer);
            }
        }
        for peer in gone {
            self.depart(&peer, registry, &mut actions);
        }

        actions
    }

    fn depart(&mut self, peer: &PeerId, registry: &ConnectionRegistry, actions: &mut Vec<TopologyAction>) {
        if registry.contains(peer) {
            actions.push(TopologyAction::Disconnect(peer.clone()));
        }
        if self.departed.insert(peer.clone()) {
            info!("topology: {} left", peer);
            actions.push(TopologyAction::NotifyDeparted(peer.clone()));
        } else {
            debug!("topology: {} already reported as departed", peer);
        }
    }

    fn needs_connect(peer: &PeerId, registry: &ConnectionRegistry) -> bool {
        matches!(
            registry.status(peer),
            ConnectionStatus::Disconnected | ConnectionStatus::Failed
        )
    }
}

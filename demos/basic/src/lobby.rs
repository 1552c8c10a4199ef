use std::collections::{HashMap, VecDeque};

use peerlink_peer::shared::{MemberRole, MembershipEvent, MembershipSource, PeerId, RosterMember};

/// What one member sees of the lobby
#[derive(Default)]
pub struct LobbyFeed {
    roster: Vec<RosterMember>,
    pending: VecDeque<MembershipEvent>,
}

impl MembershipSource for LobbyFeed {
    fn current_roster(&self) -> Vec<RosterMember> {
        self.roster.clone()
    }

    fn poll_event(&mut self) -> Option<MembershipEvent> {
        self.pending.pop_front()
    }
}

/// A tiny stand-in for a matchmaking lobby: the first member owns it, and
/// every change is fanned out to each member's feed
#[derive(Default)]
pub struct Lobby {
    members: Vec<RosterMember>,
    feeds: HashMap<PeerId, LobbyFeed>,
}

impl Lobby {
    pub fn join(&mut self, id: &str, display_name: &str) -> PeerId {
        let role = if self.members.is_empty() {
            MemberRole::Owner
        } else {
            MemberRole::Member
        };
        let member = RosterMember::new(id, display_name, role);
        let peer_id = member.peer_id.clone();

        for feed in self.feeds.values_mut() {
            feed.roster.push(member.clone());
            feed.pending.push_back(MembershipEvent::Joined(member.clone()));
        }
        self.members.push(member);
        self.feeds.insert(
            peer_id.clone(),
            LobbyFeed {
                roster: self.members.clone(),
                pending: VecDeque::new(),
            },
        );
        peer_id
    }

    /// Remove `peer`. Its own feed hears about it too, so its session can
    /// drop every link before it goes away.
    pub fn leave(&mut self, peer: &PeerId) {
        self.members.retain(|member| member.peer_id != *peer);
        for feed in self.feeds.values_mut() {
            feed.roster.retain(|member| member.peer_id != *peer);
            feed.pending.push_back(MembershipEvent::Left(peer.clone()));
        }
    }

    pub fn forget(&mut self, peer: &PeerId) {
        self.feeds.remove(peer);
    }

    pub fn feed_mut(&mut self, peer: &PeerId) -> Option<&mut LobbyFeed> {
        self.feeds.get_mut(peer)
    }
}

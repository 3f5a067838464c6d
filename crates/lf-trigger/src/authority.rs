//! Lead-Authority Selection
//!
//! Event changes are broadcast by exactly one connected participant. The
//! relay transport itself is host-owned; this module only answers "who is
//! the authority right now" deterministically, so every peer arrives at
//! the same answer without coordination.

/// A connected participant as seen by the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Host-assigned identifier; ordering is ordinal string comparison
    pub id: String,
    /// Whether the peer is currently connected
    pub active: bool,
    /// Whether the peer is allowed to act as authority
    pub can_lead: bool,
}

impl Peer {
    pub fn new(id: impl Into<String>, active: bool, can_lead: bool) -> Self {
        Self {
            id: id.into(),
            active,
            can_lead,
        }
    }
}

/// The current lead authority: the eligible active peer with the lowest id
pub fn lead_peer(peers: &[Peer]) -> Option<&Peer> {
    peers
        .iter()
        .filter(|p| p.active && p.can_lead)
        .min_by(|a, b| a.id.cmp(&b.id))
}

/// Whether the given peer id is the current lead authority
pub fn is_lead(peers: &[Peer], id: &str) -> bool {
    lead_peer(peers).is_some_and(|lead| lead.id == id)
}

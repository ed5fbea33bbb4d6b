//! Per-connection subscription manager.
//!
//! Tracks which elections a WebSocket client is subscribed to and provides
//! server-side event filtering.

use std::collections::HashSet;

use crate::domain::ElectionId;

/// Manages the set of election subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed elections. Ignored while `subscribe_all` is set.
    election_ids: HashSet<ElectionId>,
    /// Whether the client subscribes to all elections (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds elections to the subscription set and optionally enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[ElectionId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.election_ids.extend(ids.iter().copied());
    }

    /// Removes elections from the subscription set and optionally clears
    /// the wildcard.
    pub fn unsubscribe(&mut self, ids: &[ElectionId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.election_ids.remove(id);
        }
    }

    /// Returns `true` if events of `election_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, election_id: ElectionId) -> bool {
        self.subscribe_all || self.election_ids.contains(&election_id)
    }

    /// Returns the number of explicitly subscribed elections.
    #[must_use]
    pub fn count(&self) -> usize {
        self.election_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

/// Splits raw ids into parsed election ids and a wildcard flag. Entries
/// that are neither `"*"` nor a UUID are returned as rejected.
#[must_use]
pub fn parse_election_ids(raw: &[String]) -> (Vec<ElectionId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut rejected = Vec::new();
    for entry in raw {
        if entry == "*" {
            wildcard = true;
        } else if let Ok(uuid) = entry.parse::<uuid::Uuid>() {
            ids.push(ElectionId::from_uuid(uuid));
        } else {
            rejected.push(entry.clone());
        }
    }
    (ids, wildcard, rejected)
}

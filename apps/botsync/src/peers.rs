// Peer directory
// Set of known peers, keyed by nick, plus the once-per-process advertisement guard.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A peer known to this node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Nick the peer speaks under
    pub identity: String,
    /// Identifier the peer announced itself with
    pub display_tag: String,
    pub first_seen: DateTime<Utc>,
}

/// Append-only set of peers
///
/// # Invariants
/// - At most one entry per identity
/// - Entries are never removed or replaced
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: Mutex<BTreeMap<String, Peer>>,
    advertised: AtomicBool,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a peer; returns `false` if the identity was already known
    ///
    /// # Example
    /// ```
    /// use botsync::peers::PeerDirectory;
    ///
    /// let peers = PeerDirectory::new();
    /// assert!(peers.record("bob", "1234"));
    /// assert!(!peers.record("bob", "1234"));
    /// assert_eq!(peers.len(), 1);
    /// ```
    pub fn record(&self, identity: &str, display_tag: &str) -> bool {
        let mut peers = self.peers.lock();
        if peers.contains_key(identity) {
            return false;
        }
        peers.insert(
            identity.to_string(),
            Peer {
                identity: identity.to_string(),
                display_tag: display_tag.to_string(),
                first_seen: Utc::now(),
            },
        );
        true
    }

    pub fn get(&self, identity: &str) -> Option<Peer> {
        self.peers.lock().get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.peers.lock().contains_key(identity)
    }

    /// Known identities, sorted
    pub fn identities(&self) -> Vec<String> {
        self.peers.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    /// Claims the right to advertise; `true` exactly once per directory
    pub fn mark_advertised(&self) -> bool {
        !self.advertised.swap(true, Ordering::SeqCst)
    }

    pub fn has_advertised(&self) -> bool {
        self.advertised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn duplicate_identity_keeps_first_entry() {
        let peers = PeerDirectory::new();

        assert!(peers.record("bob", "first"));
        assert!(!peers.record("bob", "second"));

        assert_eq!(peers.len(), 1);
        assert_eq!(peers.get("bob").unwrap().display_tag, "first");
    }

    #[test]
    fn identities_are_sorted() {
        let peers = PeerDirectory::new();
        peers.record("carol", "c");
        peers.record("alice", "a");
        peers.record("bob", "b");

        assert_eq!(peers.identities(), vec!["alice", "bob", "carol"]);
        assert!(peers.contains("bob"));
        assert!(!peers.contains("dave"));
    }

    #[test]
    fn advertisement_guard_fires_once() {
        let peers = PeerDirectory::new();
        assert!(!peers.has_advertised());
        assert!(peers.mark_advertised());
        assert!(!peers.mark_advertised());
        assert!(peers.has_advertised());
    }

    #[test]
    fn concurrent_records_of_one_identity_insert_once() {
        let peers = Arc::new(PeerDirectory::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let peers = Arc::clone(&peers);
                std::thread::spawn(move || peers.record("bob", &i.to_string()))
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|new| *new)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(peers.len(), 1);
    }
}

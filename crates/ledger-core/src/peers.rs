use std::collections::BTreeSet;

use tracing::debug;
use url::Url;

use crate::error::PeerAddrError;

/// Known peers, stored as `host[:port]` network locations.
///
/// Backed by a sorted set so that every walk over the peers sees the same
/// order, which keeps reconciliation independent of insertion history.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer given as a URL or a bare `host:port`. Returns `true`
    /// when the peer was not known before.
    pub fn add_peer(&mut self, address: &str) -> Result<bool, PeerAddrError> {
        let location = parse_peer_address(address)?;
        let inserted = self.peers.insert(location.clone());
        if inserted {
            debug!(peer = %location, "registered peer");
        }
        Ok(inserted)
    }

    pub fn list_peers(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.peers.contains(location)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Reduce a URL or bare address to its network location. Scheme, path,
/// query and credentials are dropped.
pub fn parse_peer_address(address: &str) -> Result<String, PeerAddrError> {
    let trimmed = address.trim();
    let invalid = |reason: &str| PeerAddrError {
        address: address.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid("empty address"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;

    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_reduced_to_network_location() {
        assert_eq!(
            parse_peer_address("http://127.0.0.1:5001/").unwrap(),
            "127.0.0.1:5001"
        );
        assert_eq!(
            parse_peer_address("https://node.example.org:8443/get_chain?x=1").unwrap(),
            "node.example.org:8443"
        );
        assert_eq!(
            parse_peer_address("http://user:pw@10.0.0.2:7000").unwrap(),
            "10.0.0.2:7000"
        );
    }

    #[test]
    fn bare_address_is_accepted() {
        assert_eq!(parse_peer_address("127.0.0.1:5002").unwrap(), "127.0.0.1:5002");
        assert_eq!(parse_peer_address("  localhost:8080 ").unwrap(), "localhost:8080");
        assert_eq!(parse_peer_address("peer.local").unwrap(), "peer.local");
    }

    #[test]
    fn ipv6_hosts_keep_brackets() {
        assert_eq!(parse_peer_address("http://[::1]:5000/").unwrap(), "[::1]:5000");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_peer_address("").is_err());
        assert!(parse_peer_address("   ").is_err());
        assert!(parse_peer_address("http://").is_err());
        assert!(parse_peer_address("http://host:notaport").is_err());
    }

    #[test]
    fn add_peer_is_idempotent() {
        let mut registry = PeerRegistry::new();
        assert!(registry.add_peer("http://127.0.0.1:5001").unwrap());
        assert!(!registry.add_peer("127.0.0.1:5001").unwrap());
        assert!(!registry.add_peer("http://127.0.0.1:5001/get_chain").unwrap());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("127.0.0.1:5001"));
    }

    #[test]
    fn list_is_sorted_regardless_of_insertion_order() {
        let mut a = PeerRegistry::new();
        let mut b = PeerRegistry::new();
        for peer in ["c:3", "a:1", "b:2"] {
            a.add_peer(peer).unwrap();
        }
        for peer in ["b:2", "c:3", "a:1"] {
            b.add_peer(peer).unwrap();
        }
        assert_eq!(a.list_peers(), vec!["a:1", "b:2", "c:3"]);
        assert_eq!(a.list_peers(), b.list_peers());
    }

    #[test]
    fn rejected_address_leaves_registry_untouched() {
        let mut registry = PeerRegistry::new();
        assert!(registry.add_peer("http://").is_err());
        assert!(registry.is_empty());
    }
}

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::RwLock,
    task::JoinSet,
    time::{timeout, timeout_at, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    chain::{validate_chain, Ledger},
    constants::{PEER_TIMEOUT_MS, RECONCILE_DEADLINE_MS},
    error::PeerError,
    pow::ProofOfWork,
    Block, ChainSnapshot,
};

/// Remote "get chain" query. Lives in the core so the reconciler does not
/// depend on any particular transport.
pub trait ChainFetcher: Send + Sync + 'static {
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<ChainSnapshot, PeerError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Upper bound for a single peer's answer.
    pub peer_timeout: Duration,
    /// Upper bound for the whole pass; peers still pending are abandoned.
    pub deadline: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            peer_timeout: Duration::from_millis(PEER_TIMEOUT_MS),
            deadline: Duration::from_millis(RECONCILE_DEADLINE_MS),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub replaced: bool,
    /// Peer whose chain was adopted.
    pub source: Option<String>,
    /// Local chain length once the pass is over.
    pub length: usize,
    /// Peers skipped because they could not be queried or sent a chain
    /// whose reported length disagrees with its block count.
    pub unavailable: usize,
}

/// Longest-valid-chain reconciliation against a set of peers.
pub struct Reconciler<F> {
    fetcher: Arc<F>,
    config: ReconcileConfig,
}

impl<F> Clone for Reconciler<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            config: self.config,
        }
    }
}

impl<F: ChainFetcher> Reconciler<F> {
    pub fn new(fetcher: F, config: ReconcileConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
        }
    }

    /// Query every peer and adopt the longest valid chain that is strictly
    /// longer than the local one. Unreachable or misbehaving peers are
    /// skipped; this never fails.
    pub async fn reconcile(
        &self,
        peers: Vec<String>,
        ledger: &RwLock<Ledger>,
    ) -> ReconcileOutcome {
        let (local_length, pow) = {
            let ledger = ledger.read().await;
            (ledger.len(), *ledger.pow())
        };

        let results: Vec<_> = self
            .fetch_all(peers)
            .await
            .into_iter()
            .map(|(peer, result)| {
                let result = result.and_then(|snapshot| consistent_length(&peer, snapshot));
                (peer, result)
            })
            .collect();
        let unavailable = results.iter().filter(|(_, r)| r.is_err()).count();
        let candidates = results.into_iter().filter_map(|(peer, result)| match result {
            Ok(snapshot) => Some((peer, snapshot)),
            Err(err) => {
                warn!(error = %err, "skipping peer");
                None
            }
        });

        let Some((source, chain)) = select_longest(local_length, candidates, &pow) else {
            let length = ledger.read().await.len();
            debug!(length, "local chain is already the longest");
            return ReconcileOutcome {
                replaced: false,
                source: None,
                length,
                unavailable,
            };
        };

        let mut ledger = ledger.write().await;
        // Local mining may have overtaken the candidate while peers were queried.
        if chain.len() <= ledger.len() {
            debug!(peer = %source, "candidate no longer longer than local chain");
            return ReconcileOutcome {
                replaced: false,
                source: None,
                length: ledger.len(),
                unavailable,
            };
        }
        info!(peer = %source, length = chain.len(), "adopting longer chain from peer");
        ledger.replace_chain(chain);
        ReconcileOutcome {
            replaced: true,
            source: Some(source),
            length: ledger.len(),
            unavailable,
        }
    }

    /// Fetch all peers concurrently. Results come back sorted by peer so
    /// later selection does not depend on which answer arrived first.
    async fn fetch_all(
        &self,
        peers: Vec<String>,
    ) -> Vec<(String, Result<ChainSnapshot, PeerError>)> {
        let peer_timeout = self.config.peer_timeout;
        let deadline = Instant::now() + self.config.deadline;
        let mut pending: Vec<String> = peers.clone();
        let mut set = JoinSet::new();

        for peer in peers {
            let fetcher = Arc::clone(&self.fetcher);
            set.spawn(async move {
                let result = match timeout(peer_timeout, fetcher.fetch_chain(&peer)).await {
                    Ok(result) => result,
                    Err(_) => Err(PeerError::Timeout {
                        peer: peer.clone(),
                        timeout: peer_timeout,
                    }),
                };
                (peer, result)
            });
        }

        let mut results = Vec::new();
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((peer, result)))) => {
                    pending.retain(|p| p != &peer);
                    results.push((peer, result));
                }
                Ok(Some(Err(err))) => warn!(error = %err, "peer query task failed"),
                Ok(None) => break,
                Err(_) => {
                    set.abort_all();
                    break;
                }
            }
        }
        // Anything not answered by now timed out against the pass deadline
        // or died with its task.
        for peer in pending {
            results.push((
                peer.clone(),
                Err(PeerError::Timeout {
                    peer,
                    timeout: self.config.deadline,
                }),
            ));
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

fn consistent_length(peer: &str, snapshot: ChainSnapshot) -> Result<ChainSnapshot, PeerError> {
    if snapshot.length == snapshot.chain.len() {
        return Ok(snapshot);
    }
    Err(PeerError::MalformedPayload {
        peer: peer.to_string(),
        reason: format!(
            "reported length {} but sent {} blocks",
            snapshot.length,
            snapshot.chain.len()
        ),
    })
}

/// Pick the longest valid candidate strictly longer than `local_length`.
/// Candidates are considered in the order given; on equal length the first
/// one wins. A snapshot whose `length` disagrees with its block count is
/// treated as malformed and ignored.
pub fn select_longest(
    local_length: usize,
    candidates: impl IntoIterator<Item = (String, ChainSnapshot)>,
    pow: &ProofOfWork,
) -> Option<(String, Vec<Block>)> {
    let mut max_length = local_length;
    let mut winner = None;
    for (peer, snapshot) in candidates {
        if snapshot.length != snapshot.chain.len() {
            warn!(
                peer = %peer,
                reported = snapshot.length,
                actual = snapshot.chain.len(),
                "peer reported a length that does not match its chain"
            );
            continue;
        }
        if snapshot.length <= max_length {
            continue;
        }
        match validate_chain(&snapshot.chain, pow) {
            Ok(()) => {
                max_length = snapshot.length;
                winner = Some((peer, snapshot.chain));
            }
            Err(err) => warn!(peer = %peer, error = %err, "rejecting invalid chain"),
        }
    }
    winner
}

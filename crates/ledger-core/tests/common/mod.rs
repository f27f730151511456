#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use ledger_core::{
    Block, ChainFetcher, ChainSnapshot, Ledger, LedgerNode, NodeConfig, PeerError, ProofOfWork,
    ReconcileConfig, Transaction,
};
use std::time::Duration;

pub const TEST_DIFFICULTY: usize = 2;

pub fn pow() -> ProofOfWork {
    ProofOfWork::new(TEST_DIFFICULTY).expect("valid difficulty")
}

/// How a fake peer answers a chain query.
#[derive(Clone, Debug)]
pub enum PeerBehaviour {
    Serve(ChainSnapshot),
    Refuse,
    Status(u16),
    Hang,
}

#[derive(Default)]
pub struct MockFetcher {
    peers: HashMap<String, PeerBehaviour>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, peer: &str, behaviour: PeerBehaviour) -> Self {
        self.peers.insert(peer.to_string(), behaviour);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChainFetcher for MockFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, PeerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.peers.get(peer) {
            Some(PeerBehaviour::Serve(snapshot)) => Ok(snapshot.clone()),
            Some(PeerBehaviour::Status(status)) => Err(PeerError::Status {
                peer: peer.to_string(),
                status: *status,
            }),
            Some(PeerBehaviour::Hang) => std::future::pending().await,
            Some(PeerBehaviour::Refuse) | None => Err(PeerError::Unavailable {
                peer: peer.to_string(),
                reason: "connection refused".into(),
            }),
        }
    }
}

/// Build a valid chain of `blocks` blocks (genesis included) under the test
/// difficulty, one tagged transaction per mined block.
pub fn build_chain(blocks: usize, tag: &str) -> Vec<Block> {
    let mut ledger = Ledger::new(pow());
    while ledger.len() < blocks {
        ledger
            .add_transaction(Transaction::new(tag, "miner", ledger.len() as i64))
            .expect("genesis present");
        let previous = ledger.previous_block().expect("genesis present");
        let proof = ledger.pow().solve(previous.proof).expect("solvable");
        let hash = previous.hash();
        ledger.create_block(proof, hash);
    }
    ledger.chain().to_vec()
}

pub fn tampered_chain(blocks: usize) -> Vec<Block> {
    let mut chain = build_chain(blocks, "tampered");
    chain[1].transactions[0].amount = 1_000.into();
    chain
}

pub fn config(peer_timeout: Duration, deadline: Duration) -> NodeConfig {
    NodeConfig {
        node_id: "test-node".into(),
        difficulty: TEST_DIFFICULTY,
        reward: None,
        parallel_mining: false,
        reconcile: ReconcileConfig {
            peer_timeout,
            deadline,
        },
    }
}

pub fn node(fetcher: MockFetcher) -> LedgerNode<MockFetcher> {
    LedgerNode::new(
        config(Duration::from_millis(200), Duration::from_secs(2)),
        fetcher,
    )
    .expect("node")
}

/// Mine until the local chain reaches `length` blocks.
pub async fn grow_to(node: &LedgerNode<MockFetcher>, length: usize) {
    while node.chain().await.length < length {
        node.mine().await.expect("mine");
    }
}

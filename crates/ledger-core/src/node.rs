use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    chain::Ledger,
    consensus::{ChainFetcher, ReconcileConfig, ReconcileOutcome, Reconciler},
    constants::POW_TARGET_DIFFICULTY,
    error::{LedgerError, PeerAddrError},
    peers::PeerRegistry,
    pow::ProofOfWork,
    Block, ChainSnapshot, Transaction,
};

/// Reward transaction queued by the miner right before sealing a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiningReward {
    pub receiver: String,
    pub amount: i64,
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub node_id: String,
    pub difficulty: usize,
    pub reward: Option<MiningReward>,
    pub parallel_mining: bool,
    pub reconcile: ReconcileConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: random_node_id(),
            difficulty: POW_TARGET_DIFFICULTY,
            reward: None,
            parallel_mining: false,
            reconcile: ReconcileConfig::default(),
        }
    }
}

/// 128 random bits as 32 lowercase hex characters.
pub fn random_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// One ledger, its peers and the reconciler, shared behind async locks.
///
/// This is the object the transport layer owns and calls into. Cloning is
/// cheap and every clone sees the same state.
pub struct LedgerNode<F> {
    ledger: Arc<RwLock<Ledger>>,
    peers: Arc<RwLock<PeerRegistry>>,
    reconciler: Reconciler<F>,
    config: Arc<NodeConfig>,
}

impl<F> Clone for LedgerNode<F> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            peers: Arc::clone(&self.peers),
            reconciler: self.reconciler.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F: ChainFetcher> LedgerNode<F> {
    pub fn new(config: NodeConfig, fetcher: F) -> Result<Self, LedgerError> {
        let pow = ProofOfWork::new(config.difficulty)?;
        info!(
            node_id = %config.node_id,
            difficulty = config.difficulty,
            "ledger initialised with genesis block"
        );
        Ok(Self {
            ledger: Arc::new(RwLock::new(Ledger::new(pow))),
            peers: Arc::new(RwLock::new(PeerRegistry::new())),
            reconciler: Reconciler::new(fetcher, config.reconcile),
            config: Arc::new(config),
        })
    }

    /// Solve the puzzle for the current tip and seal the pending pool.
    ///
    /// The solve runs on the blocking pool with no lock held. If the tip
    /// moved in the meantime (another mine, or a chain replacement) the
    /// proof is stale and the search starts over on the new tip.
    pub async fn mine(&self) -> Result<Block, LedgerError> {
        loop {
            let (pow, previous_proof, previous_hash) = {
                let ledger = self.ledger.read().await;
                let previous = ledger.previous_block()?;
                (*ledger.pow(), previous.proof, previous.hash())
            };

            let parallel = self.config.parallel_mining;
            let proof = tokio::task::spawn_blocking(move || {
                if parallel {
                    pow.solve_parallel(previous_proof)
                } else {
                    pow.solve(previous_proof)
                }
            })
            .await
            .map_err(|e| LedgerError::MiningTask(e.to_string()))??;

            let mut ledger = self.ledger.write().await;
            if ledger.previous_block()?.hash() != previous_hash {
                debug!(previous_proof, "tip moved while solving, retrying");
                continue;
            }
            if let Some(reward) = &self.config.reward {
                ledger.add_transaction(Transaction::new(
                    self.config.node_id.clone(),
                    reward.receiver.clone(),
                    reward.amount,
                ))?;
            }
            return Ok(ledger.create_block(proof, previous_hash).clone());
        }
    }

    pub async fn add_transaction(&self, tx: Transaction) -> Result<u64, LedgerError> {
        self.ledger.write().await.add_transaction(tx)
    }

    pub async fn chain(&self) -> ChainSnapshot {
        self.ledger.read().await.snapshot()
    }

    pub async fn is_valid(&self) -> bool {
        self.ledger.read().await.is_valid()
    }

    pub async fn pending(&self) -> Vec<Transaction> {
        self.ledger.read().await.pending().to_vec()
    }

    pub async fn previous_block(&self) -> Result<Block, LedgerError> {
        self.ledger.read().await.previous_block().cloned()
    }

    pub async fn add_peer(&self, address: &str) -> Result<bool, PeerAddrError> {
        self.peers.write().await.add_peer(address)
    }

    pub async fn peers(&self) -> Vec<String> {
        self.peers.read().await.list_peers()
    }

    /// Run one reconciliation pass and return its outcome together with the
    /// chain as it stands afterwards.
    pub async fn reconcile(&self) -> (ReconcileOutcome, ChainSnapshot) {
        let peers = self.peers().await;
        let outcome = self.reconciler.reconcile(peers, &self.ledger).await;
        (outcome, self.chain().await)
    }
}

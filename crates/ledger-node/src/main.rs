use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::Parser;
use ledger_core::{
    constants::{MINING_REWARD, PEER_TIMEOUT_MS, POW_TARGET_DIFFICULTY, RECONCILE_DEADLINE_MS},
    node::random_node_id,
    LedgerNode, MiningReward, NodeConfig, ReconcileConfig,
};
use ledger_node::{
    constants::{DEFAULT_LISTEN, DEFAULT_SYNC_INTERVAL_SECS},
    router, HttpChainFetcher,
};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Leading zero hex characters required by the proof of work
    #[arg(long, default_value_t = POW_TARGET_DIFFICULTY)]
    difficulty: usize,

    /// Peer to register at start-up (URL or host:port); repeatable
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Queue a reward transaction to this receiver with every mined block
    #[arg(long)]
    reward_to: Option<String>,

    /// Amount of the mining reward
    #[arg(long, default_value_t = MINING_REWARD)]
    reward_amount: i64,

    /// Node identifier used as the reward sender (random when omitted)
    #[arg(long)]
    node_id: Option<String>,

    /// Search proofs on all cores
    #[arg(long)]
    parallel_mining: bool,

    /// Per-peer timeout while reconciling
    #[arg(long, default_value_t = PEER_TIMEOUT_MS)]
    peer_timeout_ms: u64,

    /// Upper bound for one reconciliation pass
    #[arg(long, default_value_t = RECONCILE_DEADLINE_MS)]
    reconcile_deadline_ms: u64,

    /// Reconcile with peers every N seconds; 0 disables the background task
    #[arg(long, default_value_t = DEFAULT_SYNC_INTERVAL_SECS)]
    sync_interval_secs: u64,
}

impl Args {
    fn node_config(&self) -> NodeConfig {
        NodeConfig {
            node_id: self.node_id.clone().unwrap_or_else(random_node_id),
            difficulty: self.difficulty,
            reward: self.reward_to.clone().map(|receiver| MiningReward {
                receiver,
                amount: self.reward_amount,
            }),
            parallel_mining: self.parallel_mining,
            reconcile: ReconcileConfig {
                peer_timeout: Duration::from_millis(self.peer_timeout_ms),
                deadline: Duration::from_millis(self.reconcile_deadline_ms),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.node_config();
    let fetcher = HttpChainFetcher::new(config.reconcile.peer_timeout)
        .context("building peer http client")?;
    let node = LedgerNode::new(config, fetcher)?;

    for peer in &args.peers {
        node.add_peer(peer)
            .await
            .with_context(|| format!("registering peer {peer}"))?;
    }

    if args.sync_interval_secs > 0 {
        let node = node.clone();
        let every = Duration::from_secs(args.sync_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately; let the node come up first.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let (outcome, _) = node.reconcile().await;
                if outcome.replaced {
                    info!(
                        length = outcome.length,
                        source = ?outcome.source,
                        "background sync replaced chain"
                    );
                } else if outcome.unavailable > 0 {
                    warn!(unavailable = outcome.unavailable, "background sync skipped peers");
                }
            }
        });
    }

    let app = router(node);
    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

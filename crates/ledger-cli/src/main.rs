use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Number;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Receiver
        #[arg(long)]
        receiver: String,
        /// Amount, integer or decimal
        #[arg(long, allow_hyphen_values = true)]
        amount: Number,
    },
    /// Mine a block from the pending pool
    Mine,
    /// Print the full chain
    Chain,
    /// Check the node's chain
    Validate,
    /// List transactions waiting for the next block
    Pending,
    /// Register peers with the node
    Connect {
        /// Peer URLs or host:port addresses
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Ask the node to adopt the longest valid chain among its peers
    Replace,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: Number,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/').to_string();
    let client = Client::new();
    debug!(%node, command = ?cli.cmd, "sending request");

    let res = match cli.cmd {
        Command::Submit {
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount,
            };
            client
                .post(format!("{node}/add_transaction"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Mine => client.get(format!("{node}/mine_block")).send().await?,
        Command::Chain => client.get(format!("{node}/get_chain")).send().await?,
        Command::Validate => client.get(format!("{node}/is_valid")).send().await?,
        Command::Pending => {
            client
                .get(format!("{node}/pending_transactions"))
                .send()
                .await?
        }
        Command::Connect { peers } => {
            client
                .post(format!("{node}/connect_node"))
                .json(&Nodes { nodes: peers })
                .send()
                .await?
        }
        Command::Replace => client.get(format!("{node}/replace_chain")).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

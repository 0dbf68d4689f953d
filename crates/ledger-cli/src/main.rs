use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ledger_core::Block;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the BPM ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a BPM reading to be mined into a new block
    Submit {
        /// Heart-rate reading carried by the block
        #[arg(long, allow_hyphen_values = true)]
        bpm: i64,
    },
    /// Print the node's current chain
    Chain,
}

#[derive(Serialize)]
struct Message {
    #[serde(rename = "BPM")]
    bpm: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Submit { bpm } => {
            debug!(node = %cli.node, bpm, "submitting reading");
            let res = client
                .post(format!("{}/", cli.node))
                .json(&Message { bpm })
                .send()
                .await?;
            let status = res.status();
            let body = res.text().await?;
            println!("status: {}", status);
            println!("{body}");
        }
        Command::Chain => {
            let res = client.get(format!("{}/", cli.node)).send().await?;
            if !res.status().is_success() {
                bail!("node answered {}", res.status());
            }
            let chain: Vec<Block> = res.json().await?;
            for block in &chain {
                println!(
                    "#{:<4} bpm={:<5} nonce={:<8} hash={} prev={}",
                    block.index,
                    block.payload,
                    block.nonce,
                    if block.hash.is_empty() { "-" } else { block.hash.as_str() },
                    if block.prev_hash.is_empty() { "-" } else { block.prev_hash.as_str() },
                );
            }
            println!("{} block(s)", chain.len());
        }
    }
    Ok(())
}

use crate::constants::{DEFAULT_ADDR, DEFAULT_MINE_TIMEOUT_SECS, UNSPECIFIED_HOST};
use anyhow::{Context, Result};
use clap::Parser;
use ledger_core::{constants::POW_TARGET_BITS, Difficulty};
use std::{net::SocketAddr, time::Duration};

/// Node settings. Every flag can also come from the environment or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work BPM ledger served over HTTP")]
pub struct Args {
    /// Port (e.g. 8080) or full address (e.g. 127.0.0.1:8080) to listen on
    #[arg(long, env = "ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Leading bits a block hash must clear
    #[arg(long, env = "TARGET_BITS", default_value_t = POW_TARGET_BITS)]
    pub target_bits: u32,

    /// Seconds a write request may spend mining before it is abandoned
    #[arg(long, env = "MINE_TIMEOUT_SECS", default_value_t = DEFAULT_MINE_TIMEOUT_SECS)]
    pub mine_timeout_secs: u64,
}

impl Args {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let raw = self.addr.trim();
        let raw = raw.strip_prefix(':').unwrap_or(raw);
        let full = if raw.parse::<u16>().is_ok() {
            format!("{UNSPECIFIED_HOST}:{raw}")
        } else {
            raw.to_string()
        };
        full.parse()
            .with_context(|| format!("invalid listen address {:?}", self.addr))
    }

    pub fn difficulty(&self) -> Result<Difficulty> {
        Ok(Difficulty::new(self.target_bits)?)
    }

    pub fn mine_timeout(&self) -> Duration {
        Duration::from_secs(self.mine_timeout_secs)
    }
}

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use ledger::config::{ChainFormat, NodeConfig, DEFAULT_DIFFICULTY};
use ledger::PeerEndpoint;

/// Run one node of the peer-to-peer proof-of-work ledger.
#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about)]
pub struct Cli {
    /// Path to the chain file. Its `.hash` companion lives alongside it.
    #[arg(long, default_value = "data/chain.json")]
    pub chain_path: PathBuf,

    /// On-disk serialization format for the chain file.
    #[arg(long, value_enum, default_value_t = CliFormat::Json)]
    pub format: CliFormat,

    /// Port the node's HTTP ingress server listens on.
    #[arg(long, default_value_t = 12345)]
    pub port: u16,

    /// Proof-of-work difficulty: the number of trailing hex zeros a
    /// valid proof's hash must end in.
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub difficulty: u32,

    /// Seed peer to contact on start-up, as `host:port`. May be given
    /// multiple times, up to the node's neighbour bound.
    #[arg(long = "seed", value_name = "HOST:PORT")]
    pub seed_peers: Vec<String>,

    /// If a chain file already exists at `chain_path`, rotate it aside
    /// and start from a fresh genesis-only chain instead of loading it.
    #[arg(long)]
    pub force_new_chain: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliFormat {
    Json,
    Binary,
}

impl From<CliFormat> for ChainFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Json => ChainFormat::Json,
            CliFormat::Binary => ChainFormat::Binary,
        }
    }
}

impl Cli {
    pub fn into_node_config(self) -> Result<NodeConfig, String> {
        let seed_peers = self
            .seed_peers
            .iter()
            .map(|s| PeerEndpoint::from_str(s).map_err(|e| format!("invalid --seed {s:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NodeConfig {
            chain_path: self.chain_path,
            format: self.format.into(),
            listen_port: self.port,
            difficulty: self.difficulty,
            seed_peers,
            force_new_chain: self.force_new_chain,
        })
    }
}

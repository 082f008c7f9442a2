use anyhow::{bail, Context, Result};
use clap::Parser;
use hashchain_core::{constants::DEFAULT_DIFFICULTY, Chain, MiningStrategy};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hashchain")]
#[command(about = "Mine a small proof-of-work chain and check it for tampering")]
struct Cli {
    /// Leading hex zeros required in every mined block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Search nonces on all cores instead of one
    #[arg(long)]
    parallel: bool,

    /// Overwrite this block's payload after mining to show tamper detection
    #[arg(long, value_name = "INDEX")]
    tamper: Option<usize>,

    /// Print the chain and validation result as JSON
    #[arg(long)]
    json: bool,

    /// Payloads to mine, one block each
    #[arg(default_values = ["first block", "second block", "third block"])]
    payloads: Vec<String>,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let strategy = if cli.parallel {
        MiningStrategy::Parallel
    } else {
        MiningStrategy::Sequential
    };

    let mut chain = Chain::with_strategy(cli.difficulty, strategy)
        .with_context(|| format!("cannot build a chain with difficulty {}", cli.difficulty))?;
    info!(difficulty = cli.difficulty, ?strategy, "chain created");

    for payload in &cli.payloads {
        if !cli.json {
            println!("Mining block {}...", chain.len());
        }
        let (block, report) = chain.add_block_with_report(payload.as_str());
        if !cli.json {
            println!(
                "Block mined: {} (nonce {}, {} attempts, {:.2?})",
                block.hash_hex(),
                report.nonce,
                report.attempts,
                report.elapsed
            );
        }
    }

    if let Some(index) = cli.tamper {
        let len = chain.len();
        let Some(block) = chain.blocks_mut().get_mut(index) else {
            bail!("cannot tamper with block {index}: chain has {len} blocks");
        };
        block.payload = "TAMPERED".to_string();
        info!(index, "payload overwritten without re-mining");
    }

    let verdict = chain.validate();

    if cli.json {
        let report = serde_json::json!({
            "chain": chain,
            "valid": verdict.is_ok(),
            "violation": verdict.as_ref().err().map(|v| serde_json::json!({
                "index": v.index(),
                "check": v.check(),
                "message": v.to_string(),
            })),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    match &verdict {
        Ok(()) => println!("Chain valid: true"),
        Err(v) => {
            println!("Chain valid: false");
            println!("  failed check: {} at block {}", v.check(), v.index());
            println!("  {v}");
        }
    }

    for block in chain.blocks() {
        println!();
        println!("Index: {}", block.index);
        println!("Timestamp: {}", block.timestamp);
        println!("Payload: {}", block.payload);
        println!("Hash: {}", block.hash_hex());
        println!("Previous Hash: {}", block.previous_hash_hex());
    }
    Ok(())
}

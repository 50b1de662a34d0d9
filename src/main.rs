//! crossrank CLI: score one query against a list of documents.
//!
//! ```text
//! crossrank <query> <document>...
//! ```
//!
//! Configuration comes from `CROSSRANK_*` environment variables; logs go to
//! stderr (filter with `RUST_LOG`), results to stdout as JSON.

use anyhow::bail;
use mimalloc::MiMalloc;
use serde::Serialize;

use crossrank::config::EngineConfig;
use crossrank::scoring::{BatchScorer, RankedDocument};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Serialize)]
struct CliOutput<'a> {
    device: String,
    backend: &'static str,
    consumed_tokens: usize,
    results: Vec<RankedDocument<'a>>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((query, documents)) = args.split_first() else {
        bail!("usage: crossrank <query> <document>...");
    };
    let documents: Vec<&str> = documents.iter().map(String::as_str).collect();

    let config = EngineConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        model_path = ?config.model_path,
        model_id = ?config.model_id,
        device = ?config.device,
        "crossrank starting"
    );

    let scorer = BatchScorer::from_engine_config(&config)?;
    let output = scorer.score_documents(query, &documents)?;

    let results = documents
        .iter()
        .zip(output.scores.iter())
        .enumerate()
        .map(|(index, (&document, &score))| RankedDocument {
            index,
            document,
            score,
        })
        .collect();

    let report = CliOutput {
        device: scorer.device_choice().to_string(),
        backend: scorer.backend_name(),
        consumed_tokens: output.consumed_tokens,
        results,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

use anyhow::{Context, Result};
use memmap2::Mmap;
use regen_core::{RegenResult, meshes_equal};
use regen_engine::TopologyEngine;
use regen_tokenizer::{DatasetRow, TokenizerConfig, detokenize};
use std::fs::File;

struct Replay {
    vertices: usize,
    tokens: usize,
    matched: bool,
}

fn replay_row(
    row: &DatasetRow,
    config: &TokenizerConfig,
    engine: &TopologyEngine,
) -> RegenResult<Replay> {
    let tokens = row.tokens(config)?;
    let decoded = detokenize(&tokens, config, engine)?;
    let full = row.full_mesh()?;
    Ok(Replay {
        vertices: full.vertex_count(),
        tokens: tokens.len(),
        matched: meshes_equal(&decoded, &full),
    })
}

/// Replays stored rows through the tokenizer and decoder.
fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("Usage: demo_tokenize <dataset.bin> [count]");
        return Ok(());
    }
    let count: usize = match args.get(2) {
        Some(n) => n.parse().with_context(|| format!("Invalid count: {}", n))?,
        None => 10,
    };

    let file = File::open(&args[1])
        .with_context(|| format!("Failed to open dataset file: {}", args[1]))?;
    let mmap = unsafe { Mmap::map(&file)? };
    let rows: Vec<DatasetRow> =
        bincode::deserialize(&mmap[..]).context("Failed to deserialize dataset")?;
    log::info!("Mapped {} rows from {}", rows.len(), args[1]);

    let engine = TopologyEngine::new();
    let config = TokenizerConfig::default();
    let mut matched = 0;
    for row in rows.iter().take(count) {
        let replay = match replay_row(row, &config, &engine) {
            Ok(replay) => replay,
            Err(e) => {
                log::warn!("{}: roundtrip MISMATCH ({})", row.uid, e);
                continue;
            }
        };
        if replay.matched {
            matched += 1;
        }

        // Share of the stream spent on the base mesh soup.
        let base_tokens = row.init_faces.len() * 9;
        log::info!(
            "{}: {} vertices, {} tokens, base {:.1}%, roundtrip {}",
            row.uid,
            replay.vertices,
            replay.tokens,
            100.0 * base_tokens as f64 / replay.tokens as f64,
            if replay.matched { "ok" } else { "MISMATCH" }
        );
    }
    log::info!("{}/{} rows reproduced exactly", matched, count.min(rows.len()));
    Ok(())
}

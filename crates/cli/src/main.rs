//! Session Replay - Main Entry Point

use std::fs::File;
use std::io::{self, BufReader, Write};

use anyhow::Context;
use clap::Parser;
use cli::{init_logging, load_config, parse_script, render_violation, replay, Args};
use proctor_engine::ProctorEngine;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs)?;

    info!("=== Proctor replay v{} ===", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;
    let mut engine = ProctorEngine::new(config)?;

    let script = if args.script.as_os_str() == "-" {
        parse_script(io::stdin().lock())?
    } else {
        let file = File::open(&args.script)
            .with_context(|| format!("Failed to open {}", args.script.display()))?;
        parse_script(BufReader::new(file))?
    };
    info!("Replaying {} ticks from {}", script.len(), args.script.display());

    // Violations stream out through the engine's sink as they are emitted
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.set_violation_sink(tx);
    let printer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        let mut printed = 0usize;
        while let Some(violation) = rx.recv().await {
            match render_violation(&violation) {
                Ok(line) => {
                    if writeln!(stdout, "{}", line).is_err() {
                        break;
                    }
                    printed += 1;
                }
                Err(e) => warn!("Failed to render violation {}: {}", violation.id, e),
            }
        }
        printed
    });

    let violations = replay(&mut engine, &script);
    for (name, status) in engine.tracking_status() {
        info!(
            "{}: {} (consecutive {}, missed {})",
            name, status.human_status, status.consecutive_detections, status.missed_frames
        );
    }
    info!("Pathway counters: {:?}", engine.pathway_counts());

    // Dropping the engine closes the sink
    drop(engine);
    let printed = printer.await.context("Violation printer failed")?;
    info!("Replay complete: {} violations ({} printed)", violations.len(), printed);

    Ok(())
}

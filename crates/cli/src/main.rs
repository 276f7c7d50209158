// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

mod runner;

#[derive(Parser, Debug)]
#[command(author, version, about = "GCX Debug scenario runner", long_about = None)]
struct Args {
    /// Path to the scenario file (YAML)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Debug configuration (YAML), replaces the scenario's `debug` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable capture-level tracing
    #[arg(short, long)]
    trace: bool,

    /// Write the final diagnostic state as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Loading scenario: {:?}", args.scenario);
    let scenario = gcxdebug_config::Scenario::from_file(&args.scenario)?;

    let config = match &args.config {
        Some(path) => {
            info!("Loading debug config: {:?}", path);
            gcxdebug_config::DebugConfig::from_file(path)?
        }
        None => scenario.debug.clone(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let ctx = runner::run_scenario(&scenario, &config, &mut out)?;
    out.flush()?;

    if let Some(path) = &args.snapshot {
        let json = ctx
            .snapshot()
            .to_json()
            .context("Failed to serialize diagnostic snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {:?}", path))?;
        info!("Snapshot written to {:?}", path);
    }

    Ok(())
}

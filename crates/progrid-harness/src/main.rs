#![forbid(unsafe_code)]

//! Replay a scroll script against a headless progressive grid.
//!
//! # Running
//!
//! ```sh
//! cargo run -p progrid-harness --bin progrid-replay -- records.json [script.json]
//! RUST_LOG=progrid.visibility=debug cargo run -p progrid-harness --bin progrid-replay -- records.json
//! ```
//!
//! `records.json` is an array of `{"group_key", "sort_key", "media_ref"}`
//! objects. Without a script the replay scrolls through the whole list in
//! viewport-sized steps, loading everything it passes. The summary is
//! printed to stdout as JSON.

use std::path::Path;
use std::process::ExitCode;

use progrid_core::{GridError, MediaRecord, records_from_json};
use progrid_harness::replay::{ReplayScript, Step, run_script};
use progrid_layout::{LayoutParams, measure_extent};
use tracing_subscriber::EnvFilter;

fn read(path: &Path) -> Result<String, GridError> {
    std::fs::read_to_string(path)
        .map_err(|e| GridError::InvalidInput(format!("{}: {e}", path.display())))
}

/// Scroll from top to bottom one viewport at a time.
fn sweep_script(records: &[MediaRecord]) -> ReplayScript {
    let mut script = ReplayScript::default();
    let rows = progrid_core::parse_records(records, &mut progrid_core::RowIdAllocator::new());
    let extent = measure_extent(rows.iter(), &LayoutParams::from_config(&script.config));
    let step = i64::from(script.viewport_extent.max(1));
    let mut offset = 0;
    while offset <= extent {
        script.steps.push(Step::Scroll { offset });
        script.steps.push(Step::Advance {
            ms: script.config.settle_delay_ms,
        });
        script.steps.push(Step::Resolve { fail_every: 0 });
        offset += step;
    }
    script
}

fn run(args: &[String]) -> Result<String, GridError> {
    let Some(records_path) = args.first() else {
        return Err(GridError::InvalidInput(
            "usage: progrid-replay <records.json> [script.json]".into(),
        ));
    };
    let records = records_from_json(&read(Path::new(records_path))?)?;
    let script = match args.get(1) {
        Some(path) => ReplayScript::from_json(&read(Path::new(path))?)?,
        None => sweep_script(&records),
    };
    tracing::info!(
        target: "progrid.grid",
        records = records.len(),
        steps = script.steps.len(),
        "starting replay"
    );
    let summary = run_script(&records, &script)?;
    serde_json::to_string_pretty(&summary).map_err(|e| GridError::InvalidInput(e.to_string()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(target: "progrid.grid", error = %err, "replay failed");
            eprintln!("progrid-replay: {err}");
            ExitCode::FAILURE
        }
    }
}

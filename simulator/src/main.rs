use anyhow::Context;
use clap::Parser;
use generator::profile::build_recording_from_config;
use gui_bridge::bridge::{default_bind_address, GuiBridge};
use gui_bridge::model::FeedModel;
use roadcore::interface::{AnomalyKind, RideRecording};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Road anomaly detection ride replayer")]
struct Args {
    /// Replay a single ride and emit a detection summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,
    #[arg(long, default_value_t = 1000)]
    cooldown_millis: i64,
    /// Replay a recorded ride (JSON) instead of generating one
    #[arg(long)]
    recording: Option<PathBuf>,
    /// Write the ride that was replayed to this path as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
    /// Keep the HTTP bridge alive for replay requests
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn load_recording(path: &PathBuf) -> anyhow::Result<RideRecording> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading ride recording {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing ride recording {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        let duration_millis = i64::try_from(args.duration_secs.saturating_mul(1000))
            .context("ride duration out of range")?;
        WorkflowConfig::from_args(args.seed, duration_millis, args.cooldown_millis)
    };
    workflow_config
        .engine
        .validate()
        .context("validating engine configuration")?;

    let runner = Runner::new(workflow_config.clone());
    let gui_bridge = GuiBridge::new(
        Arc::new(runner.clone()),
        args.bind.unwrap_or_else(default_bind_address),
    );

    if args.offline {
        let recording = match args.recording.as_ref() {
            Some(path) => load_recording(path)?,
            None => build_recording_from_config(&workflow_config.generator)?,
        };
        if let Some(path) = args.dump.as_ref() {
            let json = serde_json::to_string_pretty(&recording)?;
            fs::write(path, json)
                .with_context(|| format!("writing ride recording {}", path.display()))?;
        }

        let result = runner.execute(&recording)?;

        println!(
            "Offline run '{}' -> potholes {}, speed bumps {}, cycles {} (skipped {})",
            result.ride,
            result.count(AnomalyKind::Pothole),
            result.count(AnomalyKind::SpeedBump),
            result.metrics.cycles_run,
            result.metrics.cycles_skipped
        );
        for detection in &result.detections {
            println!(
                "  t={}ms {} via {} (confidence {:.3}, index {})",
                detection.timestamp_millis,
                detection.kind,
                detection
                    .result
                    .pattern_type
                    .map(|p| p.as_str())
                    .unwrap_or("-"),
                detection.result.confidence,
                detection.result.detection_index
            );
        }

        gui_bridge.publish(&FeedModel::from_result(&result))?;
        gui_bridge.publish_status("Offline replay results ready.");

        let report = format!(
            "ride={} potholes={} speed_bumps={} events={} metrics={:?}\n",
            result.ride,
            result.count(AnomalyKind::Pothole),
            result.count(AnomalyKind::SpeedBump),
            result.events.len(),
            result.metrics
        );
        let report_path = PathBuf::from("tools/data/offline_detection.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }
    if args.serve {
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
